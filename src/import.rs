//! CSV line importer for the order generator's export format.
//!
//! Each line has 20 comma-separated columns in this order:
//! `pedido_id, data_pedido, hora_pedido, cliente_id, cliente_nome,
//! cliente_cpf, cliente_email, cliente_estado, produto_id, produto_nome,
//! categoria, produto_preco_base, quantidade, valor_total_item,
//! cupom_codigo, cupom_desconto_pct, valor_final_item, frete_valor,
//! metodo_pagamento, status_pedido`.
//!
//! Names are double-quoted by the generator; quoted fields may contain
//! commas and `""` escapes a quote.
use crate::record::{OrderStatus, PaymentMethod, SalesOrder};
use std::io::{self, BufRead};
use thiserror::Error;
use time::macros::format_description;
use time::{Date, Time};

pub const CSV_COLUMNS: usize = 20;
/// Index of `valor_final_item`.
pub const FINAL_VALUE_COLUMN: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("expected {expected} columns, found {found}")]
    TooFewColumns { expected: usize, found: usize },
    #[error("column {column}: `{value}` is not a number")]
    InvalidNumber { column: usize, value: String },
    #[error("column {column}: `{value}` is out of range")]
    OutOfRange { column: usize, value: String },
    #[error("`{0}` is not a YYYY-MM-DD date")]
    InvalidDate(String),
    #[error("`{0}` is not a HH:MM:SS time")]
    InvalidTime(String),
}

/// Split one CSV line into unquoted fields.
pub fn split_csv_line(line: &str) -> Vec<String> {
    let line = line.trim_end_matches(['\r', '\n']);
    let mut out = Vec::with_capacity(CSV_COLUMNS);
    let mut cur = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                cur.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => out.push(std::mem::take(&mut cur)),
            _ => cur.push(c),
        }
    }
    out.push(cur);
    out
}

fn parse_u32(cols: &[String], i: usize) -> Result<u32, ImportError> {
    let s = cols[i].trim();
    if s.is_empty() {
        return Ok(0);
    }
    let v: i64 = s.parse().map_err(|_| ImportError::InvalidNumber { column: i, value: s.to_owned() })?;
    u32::try_from(v).map_err(|_| ImportError::OutOfRange { column: i, value: s.to_owned() })
}

fn parse_f64(cols: &[String], i: usize) -> Result<f64, ImportError> {
    let s = cols[i].trim();
    if s.is_empty() {
        return Ok(0.0);
    }
    s.parse().map_err(|_| ImportError::InvalidNumber { column: i, value: s.to_owned() })
}

/// `YYYY-MM-DD` as unix seconds at midnight UTC.
pub fn parse_date(s: &str) -> Result<u32, ImportError> {
    let s = s.trim();
    let date = Date::parse(s, format_description!("[year]-[month]-[day]"))
        .map_err(|_| ImportError::InvalidDate(s.to_owned()))?;
    let ts = date.midnight().assume_utc().unix_timestamp();
    u32::try_from(ts).map_err(|_| ImportError::InvalidDate(s.to_owned()))
}

/// `HH:MM:SS` as seconds since midnight.
pub fn parse_time_of_day(s: &str) -> Result<u32, ImportError> {
    let s = s.trim();
    let t = Time::parse(s, format_description!("[hour]:[minute]:[second]"))
        .map_err(|_| ImportError::InvalidTime(s.to_owned()))?;
    Ok(t.hour() as u32 * 3600 + t.minute() as u32 * 60 + t.second() as u32)
}

/// Rows seen and column total from [`sum_csv_column`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CsvColumnSum {
    pub rows: u64,
    pub sum: f64,
}

/// Sum numeric column `column` of a CSV export straight from text, skipping
/// the header line. Blank lines are ignored; rows that are too short or hold
/// a non-numeric value count as rows but add nothing.
pub fn sum_csv_column<R: BufRead>(source: R, column: usize) -> io::Result<CsvColumnSum> {
    let mut out = CsvColumnSum::default();
    for line in source.lines().skip(1) {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        out.rows += 1;
        let cols = split_csv_line(&line);
        if let Some(v) = cols.get(column).and_then(|s| s.trim().parse::<f64>().ok()) {
            out.sum += v;
        }
    }
    Ok(out)
}

/// Parse one data line (not the header) into a [`SalesOrder`].
pub fn parse_order(line: &str) -> Result<SalesOrder, ImportError> {
    let cols = split_csv_line(line);
    if cols.len() < CSV_COLUMNS {
        return Err(ImportError::TooFewColumns { expected: CSV_COLUMNS, found: cols.len() });
    }
    Ok(SalesOrder {
        order_id: parse_u32(&cols, 0)?,
        order_date: parse_date(&cols[1])?,
        seconds_of_day: parse_time_of_day(&cols[2])?,
        customer_id: parse_u32(&cols, 3)?,
        customer_name: cols[4].clone(),
        customer_cpf: cols[5].clone(),
        customer_email: cols[6].clone(),
        customer_state: cols[7].clone(),
        product_id: parse_u32(&cols, 8)?,
        product_name: cols[9].clone(),
        product_category: cols[10].clone(),
        unit_price: parse_f64(&cols, 11)?,
        quantity: parse_u32(&cols, 12)?,
        line_total: parse_f64(&cols, 13)?,
        coupon_code: cols[14].clone(),
        coupon_pct: parse_u32(&cols, 15)?,
        final_value: parse_f64(&cols, 16)?,
        freight: parse_f64(&cols, 17)?,
        payment_method: PaymentMethod::from_label(&cols[18]),
        status: OrderStatus::from_label(&cols[19]),
    })
}
