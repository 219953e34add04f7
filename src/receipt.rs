//! Receipt (nota) composition and WhatsApp delivery.
//!
//! Builds the customer-facing text message from a stored order, the shop
//! template, and resolved service names, plus the data backing the
//! public nota page and its QR code.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog;
use crate::db::DbState;
use crate::error::StoreError;
use crate::models::{Category, MessageTemplate, Order, Profile};
use crate::orders;
use crate::profile;

const MONTH_NAMES: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

/// Format a whole-rupiah amount with dot thousands separators,
/// e.g. 21000 becomes "21.000".
pub fn format_rupiah(amount: i64) -> String {
    let negative = amount < 0;
    let digits = amount.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    let offset = digits.len() % 3;
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - offset) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    if negative {
        format!("-{out}")
    } else {
        out
    }
}

/// Long-form Indonesian date, e.g. "5 Januari 2026".
pub fn long_date(date: NaiveDate) -> String {
    let month = MONTH_NAMES[date.month0() as usize];
    format!("{} {} {}", date.day(), month, date.year())
}

/// Quantity line: weight in kg for kilo orders, piece count otherwise.
/// Whole weights drop the decimal ("3 Kg", "2.5 Kg").
fn format_quantity(order: &Order) -> String {
    match order.category {
        Category::Kilo => {
            let weight = order.weight_kg.unwrap_or(0.0);
            if weight.fract() == 0.0 {
                format!("{} Kg", weight as i64)
            } else {
                format!("{weight:.1} Kg")
            }
        }
        Category::Satuan => format!("{} Pcs", order.qty.unwrap_or(0)),
    }
}

/// Public nota URL for an order number, zero-padded to six digits.
pub fn nota_url(base_url: &str, order_number: i64) -> String {
    format!("{}/nota/{:06}", base_url.trim_end_matches('/'), order_number)
}

/// Compose the receipt message.
///
/// Sections in fixed order, separated by blank lines: template header,
/// nota number, status, customer, intake date, service with speed,
/// quantity, total, nota link, template footer.
pub fn build_message(
    order: &Order,
    template: &MessageTemplate,
    service_name: &str,
    speed_name: &str,
    base_url: &str,
) -> String {
    let date = order.created_at.with_timezone(&Local).date_naive();
    let sections = [
        template.header.clone(),
        format!("No. Nota : {:06}", order.order_number),
        format!("Status : {}", order.status.label()),
        format!("Nama : {}", order.customer_name),
        format!("Tanggal Masuk : {}", long_date(date)),
        format!("Layanan : {service_name} - {speed_name}"),
        format!("Jumlah : {}", format_quantity(order)),
        format!("Total : Rp {}", format_rupiah(order.total_price)),
        format!("Link Nota :\n{}", nota_url(base_url, order.order_number)),
        template.footer.clone(),
    ];
    sections.join("\n\n")
}

/// Normalize an Indonesian phone number to its international form:
/// non-digits dropped, leading "0" replaced by "62".
pub fn normalize_phone(phone: &str) -> String {
    let digits: String = phone.chars().filter(|c| c.is_ascii_digit()).collect();
    if let Some(rest) = digits.strip_prefix('0') {
        format!("62{rest}")
    } else {
        digits
    }
}

/// wa.me deep link delivering `message` to `phone`.
pub fn whatsapp_link(phone: &str, message: &str) -> Result<String, StoreError> {
    let number = normalize_phone(phone);
    if number.is_empty() {
        return Err(StoreError::validation("phone number has no digits"));
    }
    Ok(format!(
        "https://wa.me/{number}?text={}",
        urlencoding::encode(message)
    ))
}

/// Compose the receipt for an order and open it in a WhatsApp chat with
/// the customer via the system browser.
pub fn send_via_whatsapp(db: &DbState, order_id: &str, base_url: &str) -> Result<(), StoreError> {
    let order = orders::get_order(db, order_id)?;
    let template = profile::get_template(db)?;
    let names = catalog::service_name_map(db)?;
    let service_name = order
        .service_id()
        .and_then(|id| names.get(id).cloned())
        .unwrap_or_default();
    let speed_name = catalog::get_speed(db, &order.speed_id)?.name;

    let message = build_message(&order, &template, &service_name, &speed_name, base_url);
    let link = whatsapp_link(&order.customer_phone, &message)?;

    // only wa.me links ever leave this module
    if !link.starts_with("https://wa.me/") {
        return Err(StoreError::validation("refusing to open non-WhatsApp link"));
    }
    webbrowser::open(&link).map_err(|e| StoreError::Browser(e.to_string()))?;
    info!("Opened WhatsApp receipt for order #{:06}", order.order_number);
    Ok(())
}

/// Data backing the public nota page for one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotaView {
    pub profile: Profile,
    pub order: Order,
    pub service_name: String,
    pub speed_name: String,
    pub nota_url: String,
    /// Payload for the scannable code on the printed receipt; encodes
    /// the nota URL itself.
    pub qr_payload: String,
}

/// Resolve the nota page for an order number. Unknown numbers surface as
/// [`StoreError::NotFound`] so the route can render its not-found page.
pub fn nota_view(db: &DbState, order_number: i64, base_url: &str) -> Result<NotaView, StoreError> {
    let order = orders::get_order_by_number(db, order_number)?;
    let shop = profile::get_profile(db)?;
    let names = catalog::service_name_map(db)?;
    let service_name = order
        .service_id()
        .and_then(|id| names.get(id).cloned())
        .unwrap_or_default();
    let speed_name = catalog::get_speed(db, &order.speed_id)?.name;
    let url = nota_url(base_url, order.order_number);

    Ok(NotaView {
        profile: shop,
        order,
        service_name,
        speed_name,
        qr_payload: url.clone(),
        nota_url: url,
    })
}

// ===========================================================================
// Tests
// ===========================================================================
