mod rules;

use crate::models::InvoicePayload;

/// Checks the presentation layer performs before it lets a user submit.
///
/// The relay never rejects on these; it only reports them.
pub fn validate(payload: &InvoicePayload) -> Result<(), Vec<String>> {
    let mut errs = Vec::new();
    if let Err(mut re) = rules::party_checks(payload) {
        errs.append(&mut re);
    }
    if let Err(mut re) = rules::document_checks(payload) {
        errs.append(&mut re);
    }
    if errs.is_empty() {
        Ok(())
    } else {
        Err(errs)
    }
}
