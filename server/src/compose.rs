use anyhow::{Context, Result};
use fbr_einv_core::models::{InvoicePayload, Party};
use fbr_einv_core::parsing;
use serde_json::Value;

/// Buyer fields the user changed; unset ones keep the template's defaults.
#[derive(Debug, Clone, Default)]
pub struct BuyerEdits {
    pub ntn_cnic: Option<String>,
    pub business_name: Option<String>,
    pub province: Option<String>,
    pub address: Option<String>,
}

impl BuyerEdits {
    fn apply(self, mut buyer: Party) -> Party {
        if let Some(v) = self.ntn_cnic {
            buyer.ntn_cnic = v;
        }
        if let Some(v) = self.business_name {
            buyer.business_name = v;
        }
        if let Some(v) = self.province {
            buyer.province = v;
        }
        if let Some(v) = self.address {
            buyer.address = v;
        }
        buyer
    }
}

/// Fill a scenario template with the seller form and any buyer edits.
pub fn compose(template: &Value, seller: Party, buyer: BuyerEdits) -> Result<InvoicePayload> {
    let template =
        parsing::parse_invoice_payload(template).context("Template is not an invoice payload")?;
    let buyer = buyer.apply(template.buyer());
    Ok(template.with_seller(seller).with_buyer(buyer))
}
