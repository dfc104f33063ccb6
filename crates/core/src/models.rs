use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity and location of one side of an invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub ntn_cnic: String,
    pub business_name: String,
    pub province: String,
    pub address: String,
}

/// Invoice payload as assembled by the scenario pages and sent upstream.
///
/// Line items are opaque: their shape belongs to the Invoice Authority API.
/// Anything not modelled here is kept in `extra` so a round trip through this
/// type never drops fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoicePayload {
    #[serde(rename = "invoiceType", default, skip_serializing_if = "Option::is_none")]
    pub invoice_type: Option<String>,
    #[serde(rename = "invoiceDate", default, skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<String>,
    #[serde(rename = "invoiceRefNo", default, skip_serializing_if = "Option::is_none")]
    pub invoice_ref_no: Option<String>,

    #[serde(rename = "sellerNTNCNIC", default)]
    pub seller_ntn_cnic: String,
    #[serde(rename = "sellerBusinessName", default)]
    pub seller_business_name: String,
    #[serde(rename = "sellerProvince", default)]
    pub seller_province: String,
    #[serde(rename = "sellerAddress", default)]
    pub seller_address: String,

    #[serde(rename = "buyerNTNCNIC", default)]
    pub buyer_ntn_cnic: String,
    #[serde(rename = "buyerBusinessName", default)]
    pub buyer_business_name: String,
    #[serde(rename = "buyerProvince", default)]
    pub buyer_province: String,
    #[serde(rename = "buyerAddress", default)]
    pub buyer_address: String,
    #[serde(
        rename = "buyerRegistrationType",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub buyer_registration_type: Option<String>,

    #[serde(rename = "scenarioId", default, skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,

    #[serde(default)]
    pub items: Vec<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl InvoicePayload {
    pub fn seller(&self) -> Party {
        Party {
            ntn_cnic: self.seller_ntn_cnic.clone(),
            business_name: self.seller_business_name.clone(),
            province: self.seller_province.clone(),
            address: self.seller_address.clone(),
        }
    }

    pub fn buyer(&self) -> Party {
        Party {
            ntn_cnic: self.buyer_ntn_cnic.clone(),
            business_name: self.buyer_business_name.clone(),
            province: self.buyer_province.clone(),
            address: self.buyer_address.clone(),
        }
    }

    /// Replace the seller block, typically with the user's saved seller form.
    pub fn with_seller(mut self, seller: Party) -> Self {
        self.seller_ntn_cnic = seller.ntn_cnic;
        self.seller_business_name = seller.business_name;
        self.seller_province = seller.province;
        self.seller_address = seller.address;
        self
    }

    /// Replace the template's default buyer with user-edited values.
    pub fn with_buyer(mut self, buyer: Party) -> Self {
        self.buyer_ntn_cnic = buyer.ntn_cnic;
        self.buyer_business_name = buyer.business_name;
        self.buyer_province = buyer.province;
        self.buyer_address = buyer.address;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_wire_names_and_keeps_unknown_fields() {
        let payload: InvoicePayload = serde_json::from_value(json!({
            "sellerNTNCNIC": "4641094",
            "sellerBusinessName": "ABC Trading",
            "buyerNTNCNIC": "1111111",
            "scenarioId": "SN001",
            "items": [{ "hsCode": "0101.2100", "rate": "18%" }],
            "saleOrigination": "Karachi"
        }))
        .unwrap();

        assert_eq!(payload.seller_ntn_cnic, "4641094");
        assert_eq!(payload.buyer_ntn_cnic, "1111111");
        assert_eq!(payload.scenario_id.as_deref(), Some("SN001"));
        assert_eq!(payload.items.len(), 1);
        assert_eq!(payload.extra["saleOrigination"], "Karachi");
    }

    #[test]
    fn edited_parties_override_template_defaults() {
        let template = InvoicePayload {
            invoice_type: Some("Sale Invoice".into()),
            buyer_ntn_cnic: "2046004".into(),
            buyer_business_name: "FERTILIZER MANUFAC IRS NEW".into(),
            scenario_id: Some("SN002".into()),
            ..Default::default()
        };
        let seller = Party {
            ntn_cnic: "4641094".into(),
            business_name: "ABC Trading Company".into(),
            province: "Punjab".into(),
            address: "123 Main Street, Lahore".into(),
        };
        let buyer = Party {
            ntn_cnic: "1111111".into(),
            business_name: "Walk-in Customer".into(),
            ..Default::default()
        };

        let payload = template.with_seller(seller.clone()).with_buyer(buyer.clone());

        assert_eq!(payload.seller(), seller);
        assert_eq!(payload.buyer(), buyer);
        assert_eq!(payload.invoice_type.as_deref(), Some("Sale Invoice"));

        let wire = serde_json::to_value(&payload).unwrap();
        assert_eq!(wire["sellerProvince"], "Punjab");
        assert_eq!(wire["buyerBusinessName"], "Walk-in Customer");
    }
}
