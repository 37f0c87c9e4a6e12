use crate::error::SealbootError;
use crate::stub::{MAX_STUB_BYTES, StubParams, render_stub};

fn params() -> StubParams {
    StubParams {
        region: Some("eu-central-1".into()),
        endpoint: None,
        prefix: "/cluster.x-k8s.io/3f1c".into(),
        chunks: 3,
        binary: "/usr/local/bin/sealboot".into(),
        final_path: "/etc/secret-userdata.txt".into(),
    }
}

#[test]
fn renders_bash_script_with_baked_parameters() {
    let stub = render_stub(&params()).unwrap();
    assert!(stub.starts_with("#!/bin/bash\n"));
    assert!(stub.contains(
        "exec '/usr/local/bin/sealboot' reconstruct --prefix '/cluster.x-k8s.io/3f1c' --chunks 3"
    ));
    assert!(stub.contains("--final-path '/etc/secret-userdata.txt'"));
    assert!(stub.contains("--region 'eu-central-1'"));
    assert!(!stub.contains("--endpoint"));
    assert!(!stub.contains("${"));
}

#[test]
fn endpoint_is_included_when_set() {
    let mut p = params();
    p.endpoint = Some("https://ssm.vpce.example.internal".into());
    p.region = None;
    let stub = render_stub(&p).unwrap();
    assert!(stub.contains("--endpoint 'https://ssm.vpce.example.internal'"));
    assert!(!stub.contains("--region"));
}

#[test]
fn hostile_values_stay_quoted() {
    let mut p = params();
    p.prefix = "/x'; rm -rf / #".into();
    let stub = render_stub(&p).unwrap();
    assert!(stub.contains("--prefix '/x'\\''; rm -rf / #'"));
}

#[test]
fn oversized_stub_is_rejected() {
    let mut p = params();
    p.final_path = "/tmp/".to_string() + &"a".repeat(MAX_STUB_BYTES);
    match render_stub(&p) {
        Err(SealbootError::StubTooLarge { size, limit }) => {
            assert_eq!(limit, MAX_STUB_BYTES);
            assert!(size > limit);
        }
        other => panic!("expected StubTooLarge, got: {other:?}"),
    }
}
