//! Participant step errors.
//!
//! Every variant routes the event into the compensation branch with a
//! descriptive history message; none of them crash the consuming process.

use model::Money;
use thiserror::Error;

/// Errors raised by a participant's forward action.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StepError {
    /// The payload carried no products.
    #[error("Product list is empty")]
    EmptyProductList,

    /// A product line is missing its code.
    #[error("Product must be informed")]
    ProductNotInformed,

    /// The product code does not exist in the catalog.
    #[error("Product {code} does not exist in the catalog")]
    UnknownProduct { code: String },

    /// A local record already exists for this (order, transaction) pair —
    /// a duplicate delivery or a competing transaction.
    #[error("There is another transaction for this order")]
    DuplicateTransaction,

    /// The computed payment amount is below the business minimum.
    #[error("The minimum amount for payment is {minimum}, got {amount}")]
    AmountBelowMinimum { amount: Money, minimum: Money },

    /// Not enough stock to reserve a product line.
    #[error("Insufficient stock for product {code}: requested {requested}, available {available}")]
    InsufficientStock {
        code: String,
        requested: u32,
        available: u32,
    },
}
