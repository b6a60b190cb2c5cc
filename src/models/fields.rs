//! Dual-key field access.
//!
//! The invoices table gained space-separated column names alongside the
//! original underscore ones, so one logical field may live under either
//! spelling. Reads go through [`resolve`] with an ordered candidate list.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::InvoiceRecord;

/// A logical field and the physical column names it may be stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldKey {
    pub primary: &'static str,
    pub fallback: Option<&'static str>,
}

impl FieldKey {
    pub const fn single(primary: &'static str) -> Self {
        FieldKey {
            primary,
            fallback: None,
        }
    }

    pub const fn pair(primary: &'static str, fallback: &'static str) -> Self {
        FieldKey {
            primary,
            fallback: Some(fallback),
        }
    }

    pub fn candidates(&self) -> Vec<&'static str> {
        let mut keys = vec![self.primary];
        if let Some(fallback) = self.fallback {
            keys.push(fallback);
        }
        keys
    }
}

pub const SUPPLIER_NAME: FieldKey = FieldKey::single("Supplier_Name");
pub const SUPPLIER_ADDRESS: FieldKey = FieldKey::pair("Supplier_Address", "Supplier Address");
pub const SUPPLIER_CITY: FieldKey = FieldKey::pair("Supplier_City", "Supplier City");
pub const SUPPLIER_POSTAL_CODE: FieldKey =
    FieldKey::pair("Supplier_Postal_Code", "Supplier Postal Code");
pub const SUPPLIER_COUNTRY: FieldKey = FieldKey::pair("Supplier_Country", "Supplier Country");
pub const SUPPLIER_VAT_NUMBER: FieldKey =
    FieldKey::pair("Supplier_VAT_Number", "Supplier VAT Number");
pub const SUPPLIER_SIRET: FieldKey = FieldKey::pair("Supplier_SIRET", "Supplier SIRET");
pub const CUSTOMER_NAME: FieldKey = FieldKey::pair("Customer_Name", "Customer Name");
pub const CUSTOMER_ADDRESS: FieldKey = FieldKey::pair("Customer_Address", "Customer Address");
pub const DOCUMENT_TYPE: FieldKey = FieldKey::pair("Document_Type", "Document Type");
pub const FILE_NAME: FieldKey = FieldKey::pair("File_Name", "File Name");
pub const INVOICE_NUMBER: FieldKey = FieldKey::single("Invoice_Number");
pub const INVOICE_DATE: FieldKey = FieldKey::single("Invoice_Date");
pub const DUE_DATE: FieldKey = FieldKey::single("Due_Date");
pub const CURRENCY: FieldKey = FieldKey::single("Currency");
pub const SUBTOTAL_HT: FieldKey = FieldKey::pair("Subtotal_HT", "Subtotal HT");
pub const TAX_AMOUNT: FieldKey = FieldKey::single("Tax_Amount");
pub const TOTAL_AMOUNT: FieldKey = FieldKey::single("Total_Amount");
pub const PURCHASE_ORDER_NUMBER: FieldKey = FieldKey::single("Purchase_Order_Number");
pub const PAYMENT_TERMS: FieldKey = FieldKey::single("Payment_Terms");
pub const PAYMENT_METHOD: FieldKey = FieldKey::pair("Payment_Method", "Payment Method");
pub const IBAN: FieldKey = FieldKey::single("IBAN");
pub const BIC: FieldKey = FieldKey::single("BIC");
pub const LINE_ITEMS: FieldKey = FieldKey::single("Line_Items");
pub const LINE_ITEMS_COUNT: FieldKey = FieldKey::pair("Line_Items_Count", "Line Items Count");
pub const STATUS: FieldKey = FieldKey::single("Status");
pub const PO_STATUS: FieldKey = FieldKey::single("PO_Status");
pub const CONFIDENCE_SCORE: FieldKey = FieldKey::single("Confidence_Score");
pub const EXTRACTION_CONFIDENCE: FieldKey =
    FieldKey::pair("Extraction_Confidence", "Extraction Confidence");
pub const NEEDS_REVIEW: FieldKey = FieldKey::single("Needs_Review");
pub const VALIDATION_ERRORS: FieldKey = FieldKey::pair("Validation_Errors", "Validation Errors");
pub const PDF_URL: FieldKey = FieldKey::single("PDF_B2_URL");

/// Returns the first present, non-null raw value among `keys`.
pub fn resolve_value<'a>(record: Option<&'a InvoiceRecord>, keys: &[&str]) -> Option<&'a Value> {
    let record = record?;
    keys.iter()
        .filter_map(|key| record.fields.get(*key))
        .find(|value| !value.is_null())
}

/// Resolves a field to `T`.
///
/// The first present, non-null candidate is authoritative: if it does not
/// decode as `T` the result is `None` and later candidates are not consulted.
pub fn resolve<T: DeserializeOwned>(record: Option<&InvoiceRecord>, keys: &[&str]) -> Option<T> {
    let value = resolve_value(record, keys)?;
    T::deserialize(value).ok()
}

/// JavaScript-style truthiness of a stored value. Absent and null are falsy.
pub fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}
