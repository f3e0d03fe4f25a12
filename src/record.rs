//! Sales-order schema: the canonical 192-byte record layout.
//!
//! `SALES_ORDER_FIELDS` is the one field table the ETL writer and every
//! reader share. Text widths are sized to the longest value seen in the
//! generated data plus a small margin; enumerations are stored as a single
//! byte each.
use crate::codec;
use crate::error::{DecodeError, EncodeError};
use crate::layout::{FieldKind, RecordLayout};
use crate::value::{Record, Value};
use once_cell::sync::Lazy;

/// Field names of the sales-order layout.
pub mod fields {
    pub const ORDER_ID: &str = "order_id";
    pub const ORDER_DATE: &str = "order_date";
    pub const SECONDS_OF_DAY: &str = "seconds_of_day";
    pub const CUSTOMER_ID: &str = "customer_id";
    pub const CUSTOMER_NAME: &str = "customer_name";
    pub const CUSTOMER_CPF: &str = "customer_cpf";
    pub const CUSTOMER_EMAIL: &str = "customer_email";
    pub const CUSTOMER_STATE: &str = "customer_state";
    pub const PRODUCT_ID: &str = "product_id";
    pub const PRODUCT_NAME: &str = "product_name";
    pub const PRODUCT_CATEGORY: &str = "product_category";
    pub const UNIT_PRICE: &str = "unit_price";
    pub const QUANTITY: &str = "quantity";
    pub const LINE_TOTAL: &str = "line_total";
    pub const COUPON_CODE: &str = "coupon_code";
    pub const COUPON_PCT: &str = "coupon_pct";
    pub const FINAL_VALUE: &str = "final_value";
    pub const FREIGHT: &str = "freight";
    pub const PAYMENT_METHOD: &str = "payment_method";
    pub const STATUS: &str = "status";
}

use fields::*;

pub const SALES_ORDER_FIELDS: [(&str, FieldKind, usize); 20] = [
    (ORDER_ID, FieldKind::U32, 4),
    (ORDER_DATE, FieldKind::U32, 4),     // unix seconds, midnight UTC
    (SECONDS_OF_DAY, FieldKind::U32, 4), // 0..86400
    (CUSTOMER_ID, FieldKind::U32, 4),
    (CUSTOMER_NAME, FieldKind::Text, 28),
    (CUSTOMER_CPF, FieldKind::Text, 14),
    (CUSTOMER_EMAIL, FieldKind::Text, 40),
    (CUSTOMER_STATE, FieldKind::Text, 2),
    (PRODUCT_ID, FieldKind::U32, 4),
    (PRODUCT_NAME, FieldKind::Text, 24),
    (PRODUCT_CATEGORY, FieldKind::Text, 14),
    (UNIT_PRICE, FieldKind::F64, 8),
    (QUANTITY, FieldKind::U32, 4),
    (LINE_TOTAL, FieldKind::F64, 8),
    (COUPON_CODE, FieldKind::Text, 8),
    (COUPON_PCT, FieldKind::U32, 4),
    (FINAL_VALUE, FieldKind::F64, 8),
    (FREIGHT, FieldKind::F64, 8),
    (PAYMENT_METHOD, FieldKind::U8, 1),
    (STATUS, FieldKind::U8, 1),
];

static SALES_ORDER_LAYOUT: Lazy<RecordLayout> = Lazy::new(|| {
    RecordLayout::define(SALES_ORDER_FIELDS).expect("sales order field table is valid")
});

/// The shared sales-order layout (192 bytes per record).
pub fn sales_order_layout() -> &'static RecordLayout {
    &SALES_ORDER_LAYOUT
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PaymentMethod {
    #[default]
    Unknown = 0,
    CreditCard = 1,
    Pix = 2,
    Boleto = 3,
    DebitCard = 4,
}

impl PaymentMethod {
    /// Map a source label; anything unrecognized (including "") is `Unknown`.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Cartao Credito" => Self::CreditCard,
            "Pix" => Self::Pix,
            "Boleto" => Self::Boleto,
            "Cartao Debito" => Self::DebitCard,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "",
            Self::CreditCard => "Cartao Credito",
            Self::Pix => "Pix",
            Self::Boleto => "Boleto",
            Self::DebitCard => "Cartao Debito",
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::CreditCard,
            2 => Self::Pix,
            3 => Self::Boleto,
            4 => Self::DebitCard,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OrderStatus {
    #[default]
    Unknown = 0,
    Completed = 1,
    Pending = 2,
    Cancelled = 3,
    Shipped = 4,
    Delivered = 5,
}

impl OrderStatus {
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "Concluido" => Self::Completed,
            "Pendente" => Self::Pending,
            "Cancelado" => Self::Cancelled,
            "Enviado" => Self::Shipped,
            "Entregue" => Self::Delivered,
            _ => Self::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unknown => "",
            Self::Completed => "Concluido",
            Self::Pending => "Pendente",
            Self::Cancelled => "Cancelado",
            Self::Shipped => "Enviado",
            Self::Delivered => "Entregue",
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            1 => Self::Completed,
            2 => Self::Pending,
            3 => Self::Cancelled,
            4 => Self::Shipped,
            5 => Self::Delivered,
            _ => Self::Unknown,
        }
    }
}

/// One sales-order line item.
///
/// `Default` gives every field its zero/empty value, which is what the
/// producer writes for columns it could not fill.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SalesOrder {
    pub order_id: u32,
    /// Order date as unix seconds.
    pub order_date: u32,
    pub seconds_of_day: u32,
    pub customer_id: u32,
    pub customer_name: String,
    pub customer_cpf: String,
    pub customer_email: String,
    pub customer_state: String,
    pub product_id: u32,
    pub product_name: String,
    pub product_category: String,
    pub unit_price: f64,
    pub quantity: u32,
    pub line_total: f64,
    pub coupon_code: String,
    pub coupon_pct: u32,
    pub final_value: f64,
    pub freight: f64,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
}

impl SalesOrder {
    pub fn to_record(&self) -> Record {
        Record::with_capacity(SALES_ORDER_FIELDS.len())
            .with(ORDER_ID, self.order_id)
            .with(ORDER_DATE, self.order_date)
            .with(SECONDS_OF_DAY, self.seconds_of_day)
            .with(CUSTOMER_ID, self.customer_id)
            .with(CUSTOMER_NAME, self.customer_name.as_str())
            .with(CUSTOMER_CPF, self.customer_cpf.as_str())
            .with(CUSTOMER_EMAIL, self.customer_email.as_str())
            .with(CUSTOMER_STATE, self.customer_state.as_str())
            .with(PRODUCT_ID, self.product_id)
            .with(PRODUCT_NAME, self.product_name.as_str())
            .with(PRODUCT_CATEGORY, self.product_category.as_str())
            .with(UNIT_PRICE, self.unit_price)
            .with(QUANTITY, self.quantity)
            .with(LINE_TOTAL, self.line_total)
            .with(COUPON_CODE, self.coupon_code.as_str())
            .with(COUPON_PCT, self.coupon_pct)
            .with(FINAL_VALUE, self.final_value)
            .with(FREIGHT, self.freight)
            .with(PAYMENT_METHOD, self.payment_method.code())
            .with(STATUS, self.status.code())
    }

    /// Encode under [`sales_order_layout`].
    pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        codec::encode(sales_order_layout(), &self.to_record())
    }

    /// Decode a 192-byte block produced by [`SalesOrder::encode`].
    pub fn decode(block: &[u8]) -> Result<Self, DecodeError> {
        let record = codec::decode(sales_order_layout(), block)?;
        Self::try_from(&record)
    }
}

fn get<'a>(r: &'a Record, name: &str) -> Result<&'a Value, DecodeError> {
    r.get(name).ok_or_else(|| DecodeError::MissingField(name.to_owned()))
}

fn get_u32(r: &Record, name: &str) -> Result<u32, DecodeError> {
    get(r, name)?.as_u32().ok_or_else(|| DecodeError::UnexpectedKind { name: name.to_owned(), expected: FieldKind::U32 })
}

fn get_u8(r: &Record, name: &str) -> Result<u8, DecodeError> {
    get(r, name)?.as_u8().ok_or_else(|| DecodeError::UnexpectedKind { name: name.to_owned(), expected: FieldKind::U8 })
}

fn get_f64(r: &Record, name: &str) -> Result<f64, DecodeError> {
    get(r, name)?.as_f64().ok_or_else(|| DecodeError::UnexpectedKind { name: name.to_owned(), expected: FieldKind::F64 })
}

fn get_text(r: &Record, name: &str) -> Result<String, DecodeError> {
    get(r, name)?
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| DecodeError::UnexpectedKind { name: name.to_owned(), expected: FieldKind::Text })
}

impl TryFrom<&Record> for SalesOrder {
    type Error = DecodeError;

    fn try_from(r: &Record) -> Result<Self, Self::Error> {
        Ok(Self {
            order_id: get_u32(r, ORDER_ID)?,
            order_date: get_u32(r, ORDER_DATE)?,
            seconds_of_day: get_u32(r, SECONDS_OF_DAY)?,
            customer_id: get_u32(r, CUSTOMER_ID)?,
            customer_name: get_text(r, CUSTOMER_NAME)?,
            customer_cpf: get_text(r, CUSTOMER_CPF)?,
            customer_email: get_text(r, CUSTOMER_EMAIL)?,
            customer_state: get_text(r, CUSTOMER_STATE)?,
            product_id: get_u32(r, PRODUCT_ID)?,
            product_name: get_text(r, PRODUCT_NAME)?,
            product_category: get_text(r, PRODUCT_CATEGORY)?,
            unit_price: get_f64(r, UNIT_PRICE)?,
            quantity: get_u32(r, QUANTITY)?,
            line_total: get_f64(r, LINE_TOTAL)?,
            coupon_code: get_text(r, COUPON_CODE)?,
            coupon_pct: get_u32(r, COUPON_PCT)?,
            final_value: get_f64(r, FINAL_VALUE)?,
            freight: get_f64(r, FREIGHT)?,
            payment_method: PaymentMethod::from_code(get_u8(r, PAYMENT_METHOD)?),
            status: OrderStatus::from_code(get_u8(r, STATUS)?),
        })
    }
}
