use freenet_stdlib::prelude::{Parameters, StateDelta, UpdateData, ValidateResult};
use guestbook_client::GuestbookApi;
use guestbook_common::balance::Balance;
use guestbook_common::replica::GuestbookDelta;
use guestbook_node_integration::{account, TestNode};

async fn fetch_json(url: String) -> serde_json::Value {
    let resp = reqwest::get(url).await.unwrap();
    assert!(resp.status().is_success());
    resp.json().await.unwrap()
}

#[tokio::test]
async fn contract_mirrors_node_ledger() {
    let node = TestNode::start().await;
    let client = node.client();
    client.add_message(&account("alice"), "one", Balance::ZERO).await.unwrap();
    client.add_message(&account("bob"), "two", Balance::ZERO).await.unwrap();

    let key = fetch_json(format!("{}/replica/key", node.url())).await;
    let key_bytes: Vec<u8> = serde_json::from_value(key["host_key"].clone()).unwrap();
    let host = guestbook_contract::host_key(&Parameters::from(key_bytes)).unwrap();

    let delta = fetch_json(format!("{}/replica/delta?from=0", node.url())).await;
    let bytes = serde_json::to_vec(&delta).unwrap();
    let state = guestbook_contract::update(
        &host,
        &[],
        vec![UpdateData::Delta(StateDelta::from(bytes))],
    )
    .unwrap();
    assert_eq!(state.posted(), client.get_messages().await.unwrap());

    let encoded = serde_json::to_vec(&state).unwrap();
    assert!(matches!(
        guestbook_contract::validate(&host, &encoded),
        ValidateResult::Valid
    ));

    // A record rewritten on the way to the replica no longer verifies.
    let mut forged: GuestbookDelta = serde_json::from_value(delta).unwrap();
    forged.messages[1].message.text = "three".into();
    let forged = serde_json::to_vec(&forged).unwrap();
    assert!(guestbook_contract::update(
        &host,
        &[],
        vec![UpdateData::Delta(StateDelta::from(forged))],
    )
    .is_err());

    node.shutdown().await;
}
