use crate::{
    envelope::{ApiEnvelope, Record},
    error::ApiFault,
};

/// The only `resultMsg` the provider uses for success. Compared verbatim.
pub const NORMAL_SERVICE: &str = "NORMAL_SERVICE";

/// Accept a successful envelope and hand back its records.
///
/// A success envelope without a body or without items yields no records.
pub fn validate(envelope: ApiEnvelope) -> Result<Vec<Record>, ApiFault> {
    let ApiEnvelope { header, body } = envelope;

    if header.result_msg != NORMAL_SERVICE {
        return Err(ApiFault {
            code: header.result_code,
            message: header.result_msg,
        });
    }

    Ok(body
        .and_then(|b| b.items)
        .map(|items| items.into_records())
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(json: &str) -> ApiEnvelope {
        ApiEnvelope::from_json(json).expect("test envelope must decode")
    }

    #[test]
    fn single_record_passes_through_as_one_element() {
        let env = envelope(
            r#"{"response":{"header":{"resultCode":"00","resultMsg":"NORMAL_SERVICE"},
                "body":{"items":{"item":{"stnId":"108","ta":"3.1"}}}}}"#,
        );
        let records = validate(env).unwrap();

        let expected: Record = [("stnId", "108"), ("ta", "3.1")].into_iter().collect();
        assert_eq!(records, vec![expected]);
    }

    #[test]
    fn list_of_records_keeps_order() {
        let env = envelope(
            r#"{"response":{"header":{"resultCode":"00","resultMsg":"NORMAL_SERVICE"},
                "body":{"items":{"item":[{"tm":"01"},{"tm":"02"},{"tm":"03"}]}}}}"#,
        );
        let tms: Vec<_> = validate(env)
            .unwrap()
            .iter()
            .map(|r| r.get("tm").unwrap().to_string())
            .collect();
        assert_eq!(tms, ["01", "02", "03"]);
    }

    #[test]
    fn non_success_message_is_a_fault_with_exact_code_and_message() {
        let env = envelope(
            r#"{"response":{"header":{"resultCode":"10","resultMsg":"SERVICE_ERROR"}}}"#,
        );
        let fault = validate(env).unwrap_err();
        assert_eq!(
            fault,
            ApiFault {
                code: "10".into(),
                message: "SERVICE_ERROR".into()
            }
        );
    }

    #[test]
    fn sentinel_comparison_is_case_and_whitespace_sensitive() {
        for msg in ["normal_service", "NORMAL_SERVICE ", " NORMAL_SERVICE"] {
            let json = format!(
                r#"{{"response":{{"header":{{"resultCode":"00","resultMsg":"{msg}"}},
                    "body":{{"items":{{"item":[]}}}}}}}}"#
            );
            let fault = validate(envelope(&json)).unwrap_err();
            assert_eq!(fault.message, msg);
            assert_eq!(fault.code, "00");
        }
    }

    #[test]
    fn success_without_items_is_empty() {
        let env = envelope(
            r#"{"response":{"header":{"resultCode":"00","resultMsg":"NORMAL_SERVICE"}}}"#,
        );
        assert!(validate(env).unwrap().is_empty());
    }
}
