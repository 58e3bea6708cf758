use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow, Type};
pub use storefront_common::Amount;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid {kind}: {value}")]
pub struct ConversionError {
    kind: &'static str,
    value: String,
}

impl ConversionError {
    fn new<S: Into<String>>(kind: &'static str, value: S) -> Self {
        Self { kind, value: value.into() }
    }
}

//--------------------------------------    CustomerTier     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Type, Serialize, Deserialize)]
pub enum CustomerTier {
    #[default]
    Bronze,
    Silver,
    Gold,
}

impl CustomerTier {
    /// Lifetime spend at which a customer is promoted to Silver.
    pub const SILVER_THRESHOLD: i64 = 500_000;
    /// Lifetime spend at which a customer is promoted to Gold.
    pub const GOLD_THRESHOLD: i64 = 2_000_000;

    pub fn for_lifetime_spend(total_spent: Amount) -> Self {
        match total_spent.value() {
            v if v >= Self::GOLD_THRESHOLD => Self::Gold,
            v if v >= Self::SILVER_THRESHOLD => Self::Silver,
            _ => Self::Bronze,
        }
    }
}

impl Display for CustomerTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CustomerTier::Bronze => write!(f, "Bronze"),
            CustomerTier::Silver => write!(f, "Silver"),
            CustomerTier::Gold => write!(f, "Gold"),
        }
    }
}

//--------------------------------------      Customer       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub email: String,
    pub phone: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub customer_tier: CustomerTier,
    pub total_orders: i64,
    pub total_spent: Amount,
    pub last_order_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    /// A normalized phone number, e.g. `255712345678`
    pub phone: String,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl NewCustomer {
    /// Splits a buyer's full name at the first run of whitespace into first and last name.
    pub fn new(phone: String, full_name: &str, email: Option<String>) -> Self {
        let full_name = full_name.trim();
        let (first_name, last_name) = match full_name.split_once(char::is_whitespace) {
            Some((first, rest)) => (first.to_string(), Some(rest.trim().to_string())),
            None => (full_name.to_string(), None),
        };
        Self { phone, email, first_name, last_name }
    }

    /// The email stored for the customer. Guests that do not supply one get a placeholder derived from their phone.
    pub fn email_or_guest_address(&self) -> String {
        self.email.clone().unwrap_or_else(|| format!("{}@guest.local", self.phone))
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatusType {
    /// Created at checkout. Waiting for the payment to settle.
    Pending,
    /// Paid, and waiting to be fulfilled.
    Processing,
    Shipped,
    Delivered,
    /// Cancelled by an admin, or abandoned at checkout and reaped.
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "pending"),
            OrderStatusType::Processing => write!(f, "processing"),
            OrderStatusType::Shipped => write!(f, "shipped"),
            OrderStatusType::Delivered => write!(f, "delivered"),
            OrderStatusType::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError::new("order status", s)),
        }
    }
}

//--------------------------------------    PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Paid => write!(f, "paid"),
            PaymentStatus::Failed => write!(f, "failed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            s => Err(ConversionError::new("payment status", s)),
        }
    }
}

//--------------------------------------       Address        ---------------------------------------------------------
/// Free-form postal address. Stored as a JSON blob on the order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Address {
    pub line1: Option<String>,
    pub line2: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

//--------------------------------------        Order         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub customer_id: Option<i64>,
    pub subtotal: Amount,
    pub tax_amount: Amount,
    pub shipping_amount: Amount,
    pub discount_amount: Amount,
    pub total_amount: Amount,
    pub currency: String,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatus,
    pub shipping_address: Option<Json<Address>>,
    pub billing_address: Option<Json<Address>>,
    pub notes: Option<String>,
    pub tracking_number: Option<String>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: String,
    pub currency: String,
    pub tax_amount: Amount,
    pub shipping_amount: Amount,
    pub discount_amount: Amount,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
    pub notes: Option<String>,
    pub lines: Vec<NewOrderLine>,
}

impl NewOrder {
    pub fn new<S: Into<String>>(order_number: S, currency: S, lines: Vec<NewOrderLine>) -> Self {
        Self {
            order_number: order_number.into(),
            currency: currency.into(),
            tax_amount: Amount::default(),
            shipping_amount: Amount::default(),
            discount_amount: Amount::default(),
            shipping_address: None,
            billing_address: None,
            notes: None,
            lines,
        }
    }

    /// Σ(unit price × quantity) over all lines, or `None` if it does not fit in an [`Amount`].
    pub fn checked_subtotal(&self) -> Option<Amount> {
        self.lines.iter().try_fold(Amount::default(), |acc, line| {
            line.unit_price.checked_mul(line.quantity).and_then(|price| acc.checked_add(price))
        })
    }

    /// subtotal + tax + shipping − discount, or `None` if any step overflows.
    pub fn checked_total(&self) -> Option<Amount> {
        self.checked_subtotal()?
            .checked_add(self.tax_amount)?
            .checked_add(self.shipping_amount)?
            .checked_sub(self.discount_amount)
    }
}

//--------------------------------------      OrderLine       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: i64,
    pub order_id: i64,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Amount,
    pub total_price: Amount,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Amount,
}

impl NewOrderLine {
    pub fn new<S: Into<String>>(product_id: S, quantity: i64, unit_price: Amount) -> Self {
        Self { product_id: product_id.into(), quantity, unit_price }
    }

    pub fn total_price(&self) -> Amount {
        self.unit_price * self.quantity
    }
}

//--------------------------------------  TransactionStatus   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// The USSD prompt has been sent and the provider has not reported back yet.
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    /// The payment status an order takes on once its transaction settles with this status.
    pub fn as_payment_status(&self) -> PaymentStatus {
        match self {
            TransactionStatus::Pending => PaymentStatus::Pending,
            TransactionStatus::Completed => PaymentStatus::Paid,
            TransactionStatus::Failed => PaymentStatus::Failed,
        }
    }
}

impl Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionStatus::Pending => write!(f, "pending"),
            TransactionStatus::Completed => write!(f, "completed"),
            TransactionStatus::Failed => write!(f, "failed"),
        }
    }
}

//-------------------------------------- PaymentTransaction   ---------------------------------------------------------
/// A ledger entry for one mobile-money charge attempt.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: i64,
    pub order_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub sonicpesa_order_id: Option<String>,
    pub reference: Option<String>,
    pub amount: Amount,
    pub currency: String,
    pub buyer_phone: String,
    pub buyer_name: Option<String>,
    pub buyer_email: Option<String>,
    pub status: TransactionStatus,
    /// The provider's raw outcome code, e.g. `SUCCESS`
    pub result: Option<String>,
    pub profit: Amount,
    pub provider_timestamp: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentTransaction {
    pub order_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub sonicpesa_order_id: Option<String>,
    pub amount: Amount,
    pub currency: String,
    pub buyer_phone: String,
    pub buyer_name: Option<String>,
    pub buyer_email: Option<String>,
}

/// The result code SonicPesa reports for a completed charge.
pub const SUCCESS_RESULT: &str = "SUCCESS";
/// The result code recorded against transactions whose orders were abandoned and reaped.
pub const EXPIRED_RESULT: &str = "EXPIRED";

/// The outcome of a charge, as reported by the payment provider's callback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentResult {
    pub provider_order_id: String,
    pub result: String,
    pub amount: Option<Amount>,
    pub currency: Option<String>,
    pub buyer_phone: Option<String>,
    pub reference: Option<String>,
    pub timestamp: Option<String>,
}

impl PaymentResult {
    pub fn new<S: Into<String>>(provider_order_id: S, result: S) -> Self {
        Self { provider_order_id: provider_order_id.into(), result: result.into(), ..Default::default() }
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn is_success(&self) -> bool {
        self.result.trim().eq_ignore_ascii_case(SUCCESS_RESULT)
    }

    pub fn terminal_status(&self) -> TransactionStatus {
        if self.is_success() {
            TransactionStatus::Completed
        } else {
            TransactionStatus::Failed
        }
    }
}

//--------------------------------------    ProfitMargin      ---------------------------------------------------------
/// The share of a completed charge booked as profit, held in basis points (1/100th of a percent).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitMargin(u32);

impl Default for ProfitMargin {
    fn default() -> Self {
        Self(3_000)
    }
}

impl ProfitMargin {
    pub const MAX_BASIS_POINTS: u32 = 10_000;

    pub fn from_basis_points(bps: u32) -> Result<Self, ConversionError> {
        if bps > Self::MAX_BASIS_POINTS {
            return Err(ConversionError::new("profit margin", format!("{bps} basis points")));
        }
        Ok(Self(bps))
    }

    pub fn basis_points(&self) -> u32 {
        self.0
    }

    /// `amount × margin`, truncated towards zero. Negative amounts never produce negative profit.
    pub fn profit_on(&self, amount: Amount) -> Amount {
        let profit = i128::from(amount.value()) * i128::from(self.0) / i128::from(Self::MAX_BASIS_POINTS);
        #[allow(clippy::cast_possible_truncation)]
        Amount::from(profit.max(0) as i64)
    }
}

impl Display for ProfitMargin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

impl FromStr for ProfitMargin {
    type Err = ConversionError;

    /// Accepts a fraction (`0.3`) or a percentage (`30%`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let fraction = match s.strip_suffix('%') {
            Some(pct) => pct.trim().parse::<f64>().map(|v| v / 100.0),
            None => s.parse::<f64>(),
        }
        .map_err(|_| ConversionError::new("profit margin", s))?;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(ConversionError::new("profit margin", s));
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let bps = (fraction * f64::from(Self::MAX_BASIS_POINTS)).round() as u32;
        Self::from_basis_points(bps)
    }
}
