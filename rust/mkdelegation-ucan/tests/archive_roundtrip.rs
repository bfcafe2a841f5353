//! End-to-end issuing and inspection through the textual archive form.

use base64::{Engine, engine::general_purpose::STANDARD};
use ipld_core::ipld::Ipld;
use mkdelegation_credentials::{Did, Ed25519Signer, Principal, WrappedSigner};
use mkdelegation_ucan::{
    BlockStore, CapabilitySpec, DEFAULT_MAX_DEPTH, Delegation, DelegationError, KnownAbilities,
    Proof, archive, delegate, resolve,
};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use testresult::TestResult;

fn test_signer(seed: u8) -> Ed25519Signer {
    Ed25519Signer::import(&[seed; 32]).unwrap()
}

fn now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

#[test]
fn every_field_survives_the_round_trip() -> TestResult {
    let issuer = test_signer(1);
    let audience = test_signer(2).did();
    let expiration = now() + 86_400;

    let mut fact = BTreeMap::new();
    fact.insert("region".to_string(), Ipld::String("eu-west".into()));
    fact.insert("weight".to_string(), Ipld::Integer(3));

    let delegation = Delegation::builder(&issuer, audience.clone())
        .capability("blob/allocate")
        .capability(CapabilitySpec::new("blob/accept").on("did:key:zStorage"))
        .expiration(expiration)
        .not_before(1_000)
        .nonce("abc")
        .fact(fact.clone())
        .try_build()?;

    let text = archive::format(&archive::encode(&delegation)?);
    let parsed = archive::parse(&text)?.delegation;

    assert_eq!(parsed.issuer(), &issuer.did());
    assert_eq!(parsed.audience(), &audience);
    assert_eq!(parsed.capabilities(), delegation.capabilities());
    assert_eq!(parsed.expiration(), Some(expiration));
    assert_eq!(parsed.not_before(), 1_000);
    assert_eq!(parsed.nonce(), Some("abc"));
    assert_eq!(parsed.facts(), &[fact]);
    assert_eq!(parsed.signature(), delegation.signature());
    assert_eq!(parsed, delegation);
    Ok(())
}

#[test]
fn three_level_chain_resolves_from_text() -> TestResult {
    let c = delegate(&test_signer(3), test_signer(2).did(), ["claim/cache"], None, None)?;
    let b = Delegation::builder(&test_signer(2), test_signer(1).did())
        .capability("claim/cache")
        .proof(c.clone())
        .try_build()?;
    let a = Delegation::builder(&test_signer(1), test_signer(0).did())
        .capability("claim/cache")
        .proof(b.clone())
        .try_build()?;

    let extracted = archive::parse(&archive::format(&archive::encode(&a)?))?;
    assert_eq!(extracted.blocks.len(), 3);
    assert_eq!(extracted.delegation.proofs(), &[Proof::Link(b.to_cid()?)]);

    let info = extracted.resolve(DEFAULT_MAX_DEPTH)?;
    let c_info = resolve(&c, &BlockStore::new(), DEFAULT_MAX_DEPTH)?;

    assert_eq!(info.proof_delegations.len(), 1);
    assert_eq!(info.proof_delegations[0].issuer, b.issuer().to_string());
    assert_eq!(info.proof_delegations[0].proof_delegations, vec![c_info]);
    Ok(())
}

#[test]
fn missing_proofs_are_pruned_not_fatal() -> TestResult {
    let proof = delegate(&test_signer(3), test_signer(1).did(), ["blob/accept"], None, None)?;
    let delegation = Delegation::builder(&test_signer(1), test_signer(2).did())
        .capability("blob/accept")
        .proof(proof.to_cid()?)
        .try_build()?;

    let extracted = archive::parse(&archive::format(&archive::encode(&delegation)?))?;
    let info = extracted.resolve(DEFAULT_MAX_DEPTH)?;

    assert_eq!(info.proofs.len(), 1);
    assert!(info.proof_delegations.is_empty());
    Ok(())
}

#[test]
fn base64_wrapped_text_parses() -> TestResult {
    let delegation = delegate(&test_signer(1), test_signer(2).did(), ["http/put"], None, None)?;
    let text = archive::format(&archive::encode(&delegation)?);

    let extracted = archive::parse(&STANDARD.encode(&text))?;
    assert_eq!(extracted.delegation, delegation);
    Ok(())
}

#[test]
fn did_web_issuers_sign_with_their_key() -> TestResult {
    let did: Did = "did:web:upload.example.com".parse()?;
    let issuer = WrappedSigner::new(test_signer(1), did.clone());

    let delegation = delegate(&issuer, test_signer(2).did(), ["space/blob/add"], None, None)?;
    assert_eq!(delegation.issuer(), &did);
    assert_eq!(delegation.capabilities().head.resource, did.to_string());

    let parsed = archive::parse(&archive::format(&archive::encode(&delegation)?))?;
    assert_eq!(parsed.delegation.issuer(), &did);
    Ok(())
}

#[test]
fn validation_then_build() -> TestResult {
    let known = KnownAbilities::default();
    let requested = ["blob/allocate", "made/up"];

    match known.check(&requested) {
        Err(DelegationError::UnknownCapability(unknown)) => assert_eq!(unknown, vec!["made/up"]),
        other => panic!("unexpected result: {other:?}"),
    }

    let delegation = delegate(&test_signer(1), test_signer(2).did(), requested, None, None)?;
    assert_eq!(delegation.capabilities().len(), 2);
    Ok(())
}
