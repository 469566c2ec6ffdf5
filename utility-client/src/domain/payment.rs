use mongodb::bson::{oid::ObjectId, Bson, DateTime};
use serde::{Deserialize, Serialize};

/// External ids look like `type-rest`.
pub const EXTERNAL_ID_DELIMITER: &str = "-";
pub const EXTERNAL_ID_TYPE_INDEX: i32 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Processed,
    Processing,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonetaryAmount {
    /// Decimal number stored as a string, e.g. `"12.50"`.
    pub value: String,
    pub currency: String,
    #[serde(rename = "kWh", default, skip_serializing_if = "Option::is_none")]
    pub kwh: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: Bson,
    pub recipient_id: Bson,
    pub customer_id: ObjectId,
    pub amount: MonetaryAmount,
    pub memo: String,
    pub external_id: String,
    pub status: PaymentStatus,
    pub timestamp: DateTime,
    pub service_area_id: ObjectId,
    pub vendor: String,
    #[serde(rename = "vendorId")]
    pub vendor_id: String,
    #[serde(default)]
    pub vendor_commission: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn decodes_stored_payment() {
        let payment: Payment = mongodb::bson::from_document(doc! {
            "id": 991,
            "recipient_id": "r-1",
            "customer_id": ObjectId::new(),
            "amount": { "value": "12.50", "currency": "NGN", "kWh": 5.0 },
            "memo": "Mobile payment",
            "external_id": "Residential-7781-a",
            "status": "processed",
            "timestamp": DateTime::from_millis(1_709_251_200_000),
            "service_area_id": ObjectId::new(),
            "vendor": "paystack",
            "vendorId": "v-9",
        })
        .unwrap();

        assert_eq!(payment.external_id, "Residential-7781-a");
        assert_eq!(payment.amount.value, "12.50");
        assert_eq!(payment.amount.kwh, Some(5.0));
        assert_eq!(payment.status, PaymentStatus::Processed);
    }
}
