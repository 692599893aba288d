//! Warehouse entity tables
//!
//! Integer fields are quantities or counts. Dates are [`FlexDate`] so that any
//! spreadsheet layout is accepted on input and stored canonically.
//!
//! [`FlexDate`]: crate::flex_date::FlexDate

use super::entity::{Entity, EntitySchema};

warehouse_entity! {
    /// Inbound goods arrival against a purchase order
    Arrival => table "arrivals", resource "arrivals" {
        date: Date required,
        arrival_time: Date,
        receipt_no: Text required,
        po_no: Text,
        brand: Text,
        po_qty: Integer,
        operator: Text,
        note: Text,
        item_type: Text = "Barang Jual",
    }
}

warehouse_entity! {
    /// Stock movement (putaway, picking, adjustment)
    Transaction => table "transactions", resource "transactions" {
        date: Date required,
        time_transaction: Date,
        receipt_no: Text required,
        sku: Text required,
        operate_type: Text,
        qty: Integer,
        operator: Text,
    }
}

warehouse_entity! {
    /// Value-added service job
    Vas => table "vas", resource "vas" {
        date: Date required,
        start_time: Date,
        end_time: Date,
        brand: Text,
        sku: Text required,
        vas_type: Text,
        qty: Integer,
        operator: Text,
    }
}

warehouse_entity! {
    /// Daily cycle count line
    Dcc => table "dccs", resource "dcc" {
        date: Date required,
        phy_inv: Text,
        zone: Text,
        location: Text required,
        owner: Text,
        sku: Text required,
        brand: Text,
        description: Text,
        sys_qty: Integer,
        phy_qty: Integer,
        variance: Integer,
        operator: Text,
    }
}

warehouse_entity! {
    /// Damaged goods report
    Damage => table "damages", resource "damages" {
        date: Date required,
        brand: Text,
        sku: Text required,
        description: Text,
        qty: Integer,
        damage_note: Text,
        damage_reason: Text,
        operator: Text,
        qc_by: Text,
    }
}

warehouse_entity! {
    /// Stock-on-hand snapshot line
    Soh => table "sohs", resource "soh" {
        location: Text required,
        location_category: Text,
        sku: Text required,
        sku_category: Text,
        brand: Text,
        zone: Text,
        location_type: Text,
        owner: Text,
        status: Text,
        qty: Integer,
        wh_arrival_date: Date,
        receipt_no: Text,
        mfg_date: Date,
        exp_date: Date,
        batch_no: Text,
        update_date: Date,
    }
}

warehouse_entity! {
    /// Quality-check result for returned goods
    QcReturn => table "qc_returns", resource "qc-returns" {
        qc_date: Date required,
        receipt: Text,
        return_date: Date,
        owner: Text,
        sku: Text required,
        qty: Integer,
        from_loc: Text,
        to_loc: Text,
        status: Text,
        operator: Text,
    }
}

warehouse_entity! {
    /// Storage location master data
    Location => table "locations", resource "locations" {
        location: Text required,
        location_category: Text,
        zone: Text,
        location_type: Text,
    }
}

warehouse_entity! {
    /// Attendance line; clock times stay free text as typed at the kiosk
    Attendance => table "attendances", resource "attendances" {
        date: Date required,
        nik: Text required,
        name: Text,
        jobdesc: Text,
        clock_in: Text,
        clock_out: Text,
        status: Text,
    }
}

warehouse_entity! {
    /// Warehouse staff roster (not login accounts)
    Employee => table "employees", resource "employees" {
        nik: Text required,
        name: Text required,
        status: Text,
        is_active: Text = "Active",
    }
}

warehouse_entity! {
    ProjectProductivity => table "project_productivities", resource "project-productivities" {
        date: Date required,
        project: Text required,
        activity: Text,
        operator: Text,
        qty: Integer,
        duration: Text,
        status: Text,
    }
}

warehouse_entity! {
    /// Inbound vehicle unloading tally
    Unloading => table "unloadings", resource "unloadings" {
        date: Date required,
        brand: Text required,
        vehicle_type: Text,
        total_vehicles: Integer,
    }
}

/// Every entity table, in route registration order
pub static ENTITY_SCHEMAS: [EntitySchema; 12] = [
    Arrival::SCHEMA,
    Transaction::SCHEMA,
    Vas::SCHEMA,
    Dcc::SCHEMA,
    Damage::SCHEMA,
    Soh::SCHEMA,
    QcReturn::SCHEMA,
    Location::SCHEMA,
    Attendance::SCHEMA,
    Employee::SCHEMA,
    ProjectProductivity::SCHEMA,
    Unloading::SCHEMA,
];
