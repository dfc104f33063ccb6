use crate::models::InvoicePayload;

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

pub fn party_checks(payload: &InvoicePayload) -> Result<(), Vec<String>> {
    let mut errs = Vec::new();

    if blank(&payload.seller_ntn_cnic) {
        errs.push("sellerNTNCNIC: seller NTN/CNIC is mandatory".to_string());
    }
    if blank(&payload.seller_business_name) {
        errs.push("sellerBusinessName: seller business name is mandatory".to_string());
    }
    if blank(&payload.buyer_ntn_cnic) {
        errs.push("buyerNTNCNIC: buyer NTN/CNIC is mandatory".to_string());
    }

    if errs.is_empty() {
        Ok(())
    } else {
        Err(errs)
    }
}

pub fn document_checks(payload: &InvoicePayload) -> Result<(), Vec<String>> {
    let mut errs = Vec::new();

    // Scenario identifiers are "SN" followed by three digits (SN001..SN028)
    match payload.scenario_id.as_deref() {
        None => errs.push("scenarioId: scenario identifier is missing".to_string()),
        Some(id) if !is_scenario_id(id) => {
            errs.push(format!("scenarioId: '{id}' is not of the form SNnnn"))
        }
        Some(_) => {}
    }

    if payload.items.is_empty() {
        errs.push("items: at least one line item is required".to_string());
    }

    if errs.is_empty() {
        Ok(())
    } else {
        Err(errs)
    }
}

fn is_scenario_id(id: &str) -> bool {
    id.len() == 5
        && id.starts_with("SN")
        && id[2..].chars().all(|c| c.is_ascii_digit())
}
