use std::fmt::Display;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    db_types::{Address, Amount, Customer, NewCustomer, NewOrder, NewOrderLine, Order, OrderLine, PaymentTransaction},
    helpers::{PhoneRules, DEFAULT_COUNTRY_CODE, DEFAULT_NATIONAL_DIGITS},
    traits::PaymentProviderError,
};

/// One line of the buyer's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Amount,
}

impl CartLine {
    pub fn new<S: Into<String>>(product_id: S, quantity: i64, unit_price: Amount) -> Self {
        Self { product_id: product_id.into(), quantity, unit_price }
    }
}

/// What the storefront submits when the buyer presses "pay".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub buyer_name: String,
    #[serde(default)]
    pub buyer_phone: String,
    #[serde(default)]
    pub buyer_email: Option<String>,
    #[serde(default)]
    pub tax_amount: Option<Amount>,
    #[serde(default)]
    pub shipping_amount: Option<Amount>,
    #[serde(default)]
    pub discount_amount: Option<Amount>,
    #[serde(default)]
    pub shipping_address: Option<Address>,
    #[serde(default)]
    pub billing_address: Option<Address>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl CheckoutRequest {
    pub fn new<S: Into<String>>(buyer_name: S, buyer_phone: S, items: Vec<CartLine>) -> Self {
        Self { items, buyer_name: buyer_name.into(), buyer_phone: buyer_phone.into(), ..Default::default() }
    }

    pub fn with_email<S: Into<String>>(mut self, email: S) -> Self {
        self.buyer_email = Some(email.into());
        self
    }
}

/// Checkout settings that come from configuration rather than from the buyer.
#[derive(Debug, Clone)]
pub struct CheckoutOptions {
    pub currency: String,
    pub phone_rules: PhoneRules,
    /// When set, failing to record the pending transaction fails the checkout, even though the payment prompt has
    /// already been sent.
    pub strict_ledger: bool,
}

impl Default for CheckoutOptions {
    fn default() -> Self {
        Self {
            currency: storefront_common::DEFAULT_CURRENCY.to_string(),
            phone_rules: PhoneRules::new(DEFAULT_COUNTRY_CODE, DEFAULT_NATIONAL_DIGITS),
            strict_ledger: false,
        }
    }
}

/// A checkout request that has passed validation, with the buyer's phone number normalized.
#[derive(Debug, Clone)]
pub struct ValidatedCheckout {
    pub customer: NewCustomer,
    pub buyer_name: String,
    pub order: NewOrder,
}

impl CheckoutOptions {
    /// Validates a checkout request before anything is persisted, and builds the records to be written.
    pub fn validate(&self, request: CheckoutRequest, order_number: String) -> Result<ValidatedCheckout, ValidationError> {
        let buyer_name = request.buyer_name.trim().to_string();
        if buyer_name.is_empty() {
            return Err(ValidationError::MissingName);
        }
        let phone = self.phone_rules.normalize(&request.buyer_phone)?;
        if request.items.is_empty() {
            return Err(ValidationError::EmptyCart);
        }
        let mut lines = Vec::with_capacity(request.items.len());
        for item in request.items {
            if item.product_id.trim().is_empty() {
                return Err(ValidationError::MissingProductId);
            }
            if item.quantity <= 0 {
                return Err(ValidationError::InvalidQuantity { product_id: item.product_id, quantity: item.quantity });
            }
            if item.unit_price.is_negative() {
                return Err(ValidationError::NegativeAmount(format!("unit price of {}", item.product_id)));
            }
            if item.unit_price.checked_mul(item.quantity).is_none() {
                return Err(ValidationError::Overflow);
            }
            lines.push(NewOrderLine::new(item.product_id.trim(), item.quantity, item.unit_price));
        }
        let mut order = NewOrder::new(order_number, self.currency.clone(), lines);
        for (name, value, field) in [
            ("tax amount", request.tax_amount, &mut order.tax_amount),
            ("shipping amount", request.shipping_amount, &mut order.shipping_amount),
            ("discount amount", request.discount_amount, &mut order.discount_amount),
        ] {
            let value = value.unwrap_or_default();
            if value.is_negative() {
                return Err(ValidationError::NegativeAmount(name.to_string()));
            }
            *field = value;
        }
        order.shipping_address = request.shipping_address;
        order.billing_address = request.billing_address;
        order.notes = request.notes.filter(|n| !n.trim().is_empty());
        match order.checked_subtotal() {
            None => return Err(ValidationError::Overflow),
            Some(s) if !s.is_positive() => return Err(ValidationError::ZeroTotal),
            Some(_) => {},
        }
        match order.checked_total() {
            None => return Err(ValidationError::Overflow),
            Some(t) if t.is_negative() => return Err(ValidationError::NegativeTotal),
            Some(_) => {},
        }
        let email = request.buyer_email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty());
        let customer = NewCustomer::new(phone, &buyer_name, email);
        Ok(ValidatedCheckout { customer, buyer_name, order })
    }
}

/// The records written by a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutReceipt {
    pub customer: Customer,
    pub order: Order,
    pub lines: Vec<OrderLine>,
    /// `None` if the payment prompt was sent but the ledger entry could not be written.
    pub transaction: Option<PaymentTransaction>,
    pub provider_order_id: Option<String>,
}

/// The checkout steps, in the order they run. Failures name the step they happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Validation,
    Customer,
    Order,
    OrderLines,
    PaymentRequest,
    Transaction,
}

impl Display for CheckoutStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckoutStep::Validation => write!(f, "validate the checkout request"),
            CheckoutStep::Customer => write!(f, "save the customer"),
            CheckoutStep::Order => write!(f, "create the order"),
            CheckoutStep::OrderLines => write!(f, "save the order lines"),
            CheckoutStep::PaymentRequest => write!(f, "request the payment"),
            CheckoutStep::Transaction => write!(f, "record the payment transaction"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter your name.")]
    MissingName,
    #[error("Please enter your phone number.")]
    MissingPhone,
    #[error("{0} is not a valid mobile number.")]
    InvalidPhone(String),
    #[error("Your cart is empty.")]
    EmptyCart,
    #[error("Every cart item needs a product id.")]
    MissingProductId,
    #[error("Invalid quantity {quantity} for {product_id}.")]
    InvalidQuantity { product_id: String, quantity: i64 },
    #[error("The {0} cannot be negative.")]
    NegativeAmount(String),
    #[error("The order total must be more than zero.")]
    ZeroTotal,
    #[error("The discount is larger than the order total.")]
    NegativeTotal,
    #[error("The order total is too large.")]
    Overflow,
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("Could not {step}. {reason}")]
    Persistence { step: CheckoutStep, reason: String },
    #[error("Payment request for order {order_number} failed. {source}")]
    Payment { order_number: String, source: PaymentProviderError },
}

impl CheckoutError {
    pub fn step(&self) -> CheckoutStep {
        match self {
            CheckoutError::Validation(_) => CheckoutStep::Validation,
            CheckoutError::Persistence { step, .. } => *step,
            CheckoutError::Payment { .. } => CheckoutStep::PaymentRequest,
        }
    }

    /// The order number, if the order was saved before the checkout failed.
    pub fn order_number(&self) -> Option<&str> {
        match self {
            CheckoutError::Payment { order_number, .. } => Some(order_number.as_str()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn cart() -> Vec<CartLine> {
        vec![CartLine::new("sku-kanga", 2, Amount::from(2_500)), CartLine::new("sku-kikoi", 1, Amount::from(5_000))]
    }

    #[test]
    fn valid_checkout() {
        let options = CheckoutOptions::default();
        let request = CheckoutRequest::new(" Asha Juma ", "0712 345 678", cart());
        let v = options.validate(request, "ORD-1".into()).unwrap();
        assert_eq!(v.customer.phone, "255712345678");
        assert_eq!(v.customer.first_name, "Asha");
        assert_eq!(v.buyer_name, "Asha Juma");
        assert_eq!(v.order.checked_subtotal().unwrap(), Amount::from(10_000));
        assert_eq!(v.order.checked_total().unwrap(), Amount::from(10_000));
        assert_eq!(v.order.currency, "TZS");
        assert_eq!(v.order.order_number, "ORD-1");
    }

    #[test]
    fn adjustments() {
        let mut request = CheckoutRequest::new("Asha", "255712345678", cart());
        request.shipping_amount = Some(Amount::from(3_000));
        request.discount_amount = Some(Amount::from(1_000));
        let v = CheckoutOptions::default().validate(request.clone(), "ORD-2".into()).unwrap();
        assert_eq!(v.order.checked_total().unwrap(), Amount::from(12_000));

        request.discount_amount = Some(Amount::from(20_000));
        let err = CheckoutOptions::default().validate(request.clone(), "ORD-2".into()).unwrap_err();
        assert_eq!(err, ValidationError::NegativeTotal);

        request.discount_amount = Some(Amount::from(-1));
        let err = CheckoutOptions::default().validate(request, "ORD-2".into()).unwrap_err();
        assert_eq!(err, ValidationError::NegativeAmount("discount amount".into()));
    }

    #[test]
    fn oversized_adjustments() {
        let options = CheckoutOptions::default();
        let mut request = CheckoutRequest::new("Asha", "255712345678", cart());
        request.tax_amount = Some(Amount::from(i64::MAX));
        assert_eq!(options.validate(request.clone(), "ORD-6".into()).unwrap_err(), ValidationError::Overflow);

        request.tax_amount = Some(Amount::from(i64::MAX / 2));
        request.shipping_amount = Some(Amount::from(i64::MAX / 2));
        assert_eq!(options.validate(request.clone(), "ORD-6".into()).unwrap_err(), ValidationError::Overflow);

        request.tax_amount = Some(Amount::from(i64::MAX - 10_000));
        request.shipping_amount = None;
        request.discount_amount = Some(Amount::from(i64::MAX));
        let v = options.validate(request, "ORD-6".into()).unwrap();
        assert_eq!(v.order.checked_total(), Some(Amount::from(0)));
    }

    #[test]
    fn invalid_checkouts() {
        let options = CheckoutOptions::default();
        let check = |request: CheckoutRequest| options.validate(request, "ORD-3".into()).unwrap_err();

        assert_eq!(check(CheckoutRequest::new("  ", "0712345678", cart())), ValidationError::MissingName);
        assert_eq!(check(CheckoutRequest::new("Asha", "", cart())), ValidationError::MissingPhone);
        assert!(matches!(check(CheckoutRequest::new("Asha", "12345", cart())), ValidationError::InvalidPhone(_)));
        assert_eq!(check(CheckoutRequest::new("Asha", "0712345678", vec![])), ValidationError::EmptyCart);

        let zero_qty = vec![CartLine::new("sku-kanga", 0, Amount::from(2_500))];
        assert!(matches!(
            check(CheckoutRequest::new("Asha", "0712345678", zero_qty)),
            ValidationError::InvalidQuantity { quantity: 0, .. }
        ));
        let free = vec![CartLine::new("sku-sample", 1, Amount::from(0))];
        assert_eq!(check(CheckoutRequest::new("Asha", "0712345678", free)), ValidationError::ZeroTotal);
        let huge = vec![CartLine::new("sku-gold", i64::MAX, Amount::from(2))];
        assert_eq!(check(CheckoutRequest::new("Asha", "0712345678", huge)), ValidationError::Overflow);
    }

    #[test]
    fn request_from_json() {
        let json = r#"{
            "items": [{"product_id": "sku-kanga", "quantity": 2, "unit_price": "2500"}],
            "buyer_name": "Asha",
            "buyer_phone": "+255712345678",
            "buyer_email": "  "
        }"#;
        let request: CheckoutRequest = serde_json::from_str(json).unwrap();
        let v = CheckoutOptions::default().validate(request, "ORD-4".into()).unwrap();
        assert_eq!(v.customer.email, None);
        assert_eq!(v.order.checked_subtotal().unwrap(), Amount::from(5_000));
    }

    #[test]
    fn error_steps() {
        let e = CheckoutError::from(ValidationError::EmptyCart);
        assert_eq!(e.step(), CheckoutStep::Validation);
        let e = CheckoutError::Persistence { step: CheckoutStep::OrderLines, reason: "disk full".into() };
        assert_eq!(e.to_string(), "Could not save the order lines. disk full");
        let e = CheckoutError::Payment {
            order_number: "ORD-5".into(),
            source: PaymentProviderError::Timeout("30s".into()),
        };
        assert_eq!(e.step(), CheckoutStep::PaymentRequest);
        assert_eq!(e.order_number(), Some("ORD-5"));
    }
}
