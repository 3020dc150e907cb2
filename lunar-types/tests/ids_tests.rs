use lunar_types::{Error, MAX_ID_LEN, ResourceId, ResourceKind, UserId};
use proptest::prelude::*;
use std::collections::HashSet;
use std::str::FromStr;

// ── UserId ────────────────────────────────────────────────────────

#[test]
fn user_id_accepts_plain_segment() {
    let id = UserId::parse("u1").unwrap();
    assert_eq!(id.as_str(), "u1");
    assert_eq!(id.to_string(), "u1");
}

#[test]
fn user_id_accepts_email_like_values() {
    assert!(UserId::parse("admin@lunarbase.ai").is_ok());
}

#[test]
fn user_id_rejects_empty() {
    assert!(matches!(UserId::parse(""), Err(Error::InvalidId { .. })));
}

#[test]
fn user_id_rejects_separators() {
    assert!(UserId::parse("a/b").is_err());
    assert!(UserId::parse("a\\b").is_err());
    assert!(UserId::parse("nul\0").is_err());
}

#[test]
fn user_id_rejects_dot_segments() {
    assert!(UserId::parse(".").is_err());
    assert!(UserId::parse("..").is_err());
    assert!(UserId::parse("..hidden").is_err());
    assert!(UserId::parse("a..b").is_ok());
}

#[test]
fn ids_reject_leading_dot() {
    assert!(UserId::parse(".admin").is_err());
    assert!(ResourceId::parse(".cfg").is_err());
    assert!(ResourceId::parse("cfg.").is_ok());
}

#[test]
fn ids_reject_glob_characters() {
    for value in ["team[1]", "a*", "what?", "x]"] {
        assert!(UserId::parse(value).is_err(), "{value} accepted as user id");
        assert!(ResourceId::parse(value).is_err(), "{value} accepted as resource id");
    }
}

#[test]
fn user_id_rejects_overlong() {
    let long = "x".repeat(MAX_ID_LEN + 1);
    assert!(UserId::parse(&long).is_err());
    assert!(UserId::parse(&long[..MAX_ID_LEN]).is_ok());
}

#[test]
fn longest_id_fits_a_document_file_name() {
    assert!(MAX_ID_LEN + ".json".len() <= 255);
}

#[test]
fn user_id_error_names_value() {
    let err = UserId::parse("../etc").unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("user id"));
    assert!(msg.contains("../etc"));
}

#[test]
fn user_id_serde_is_transparent_string() {
    let id = UserId::parse("u1").unwrap();
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"u1\"");
    let back: UserId = serde_json::from_str("\"u1\"").unwrap();
    assert_eq!(back, id);
}

#[test]
fn user_id_deserialize_validates() {
    assert!(serde_json::from_str::<UserId>("\"a/b\"").is_err());
}

// ── ResourceId ────────────────────────────────────────────────────

#[test]
fn generated_ids_are_unique() {
    let ids: HashSet<ResourceId> = (0..100).map(|_| ResourceId::generate()).collect();
    assert_eq!(ids.len(), 100);
}

#[test]
fn generated_id_is_uuid() {
    let id = ResourceId::generate();
    assert!(uuid::Uuid::parse_str(id.as_str()).is_ok());
}

#[test]
fn generated_id_reparses() {
    let id = ResourceId::generate();
    assert_eq!(ResourceId::from_str(id.as_str()).unwrap(), id);
}

#[test]
fn resource_id_rejects_traversal() {
    assert!(ResourceId::parse("../../secrets").is_err());
    assert!(ResourceId::parse("..").is_err());
}

// ── ResourceKind ──────────────────────────────────────────────────

#[test]
fn kind_parse_roundtrip() {
    for kind in ResourceKind::ALL {
        assert_eq!(ResourceKind::from_str(kind.as_str()).unwrap(), kind);
    }
}

#[test]
fn kind_parse_is_lenient_about_case_and_dashes() {
    assert_eq!(
        ResourceKind::from_str("Component-Index").unwrap(),
        ResourceKind::ComponentIndex
    );
}

#[test]
fn kind_parse_unknown() {
    assert_eq!(
        ResourceKind::from_str("ftp"),
        Err(Error::UnknownKind("ftp".to_string()))
    );
}

#[test]
fn only_datasource_and_llm_are_documents() {
    let documents: Vec<_> = ResourceKind::ALL
        .into_iter()
        .filter(|k| k.is_document())
        .collect();
    assert_eq!(documents, vec![ResourceKind::Datasource, ResourceKind::Llm]);
}

// ── Properties ────────────────────────────────────────────────────

proptest! {
    #[test]
    fn any_valid_segment_roundtrips(s in "[A-Za-z0-9_@.-]{1,64}") {
        prop_assume!(!s.starts_with('.'));
        let id = ResourceId::parse(&s).unwrap();
        prop_assert_eq!(id.as_str(), s.as_str());
    }

    #[test]
    fn anything_with_a_slash_is_rejected(a in "[a-z]{0,8}", b in "[a-z]{0,8}") {
        let joined = format!("{a}/{b}");
        prop_assert!(UserId::parse(&joined).is_err());
    }
}
