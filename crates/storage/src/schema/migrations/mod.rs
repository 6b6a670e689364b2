#![forbid(unsafe_code)]

//! The application's migration history. Shipped entries are frozen: fix a
//! mistake with a new version, never by editing an old one.

mod v002_product_barcode;
mod v003_custody_transfers;
mod v004_custody_status_transferred;
mod v005_product_price_cents;
mod v006_user_last_login;

use ct_core::Migration;

pub const BUILTIN: &[Migration] = &[
    Migration::baseline("baseline"),
    v002_product_barcode::MIGRATION,
    v003_custody_transfers::MIGRATION,
    v004_custody_status_transferred::MIGRATION,
    v005_product_price_cents::MIGRATION,
    v006_user_last_login::MIGRATION,
];
