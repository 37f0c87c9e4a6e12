use crate::error::SealbootError;
use crate::prefix::{DEFAULT_NAMESPACE_ROOT, chunk_name, generate_prefix, normalize_prefix};

#[test]
fn strips_reserved_namespace_tokens() {
    assert_eq!(normalize_prefix("aws/foo").unwrap(), "/foo");
    assert_eq!(normalize_prefix("/ssm.foo").unwrap(), "/foo");
    assert_eq!(normalize_prefix("SSM/foo").unwrap(), "/foo");
    assert_eq!(normalize_prefix("/AwS/nested/path").unwrap(), "/nested/path");
}

#[test]
fn adds_leading_slash() {
    assert_eq!(normalize_prefix("bar").unwrap(), "/bar");
    assert_eq!(normalize_prefix("///bar/").unwrap(), "/bar");
}

#[test]
fn keeps_names_that_merely_start_with_a_token() {
    assert_eq!(normalize_prefix("awesome/x").unwrap(), "/awesome/x");
    assert_eq!(normalize_prefix("ssmfoo").unwrap(), "/ssmfoo");
}

#[test]
fn rejects_empty_prefix() {
    assert!(matches!(normalize_prefix(""), Err(SealbootError::InvalidPrefix(_))));
    assert!(matches!(normalize_prefix("/"), Err(SealbootError::InvalidPrefix(_))));
    assert!(matches!(normalize_prefix("aws/"), Err(SealbootError::InvalidPrefix(_))));
}

#[test]
fn generated_prefixes_are_unique_and_rooted() {
    let a = generate_prefix(DEFAULT_NAMESPACE_ROOT).unwrap();
    let b = generate_prefix(DEFAULT_NAMESPACE_ROOT).unwrap();
    assert_ne!(a, b);
    assert!(a.starts_with("/cluster.x-k8s.io/"));
    let id = a.rsplit('/').next().unwrap();
    assert_eq!(id.len(), 36);
}

#[test]
fn chunk_names_append_index() {
    assert_eq!(chunk_name("/p", 0), "/p/0");
    assert_eq!(chunk_name("/p", 12), "/p/12");
}
