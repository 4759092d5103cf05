use guestbook_client::{ApiError, AppError, GuestbookApi};
use guestbook_common::balance::{Balance, ONE_NEAR};
use guestbook_common::message::{PostedMessage, PREMIUM_THRESHOLD};
use guestbook_node_integration::{account, contract_id, TestNode};

#[tokio::test]
async fn hello_then_world() {
    let node = TestNode::start().await;
    let client = node.client();
    let alice = account("alice");
    let bob = account("bob");

    let first = client.add_message(&alice, "hello", Balance::ZERO).await.unwrap();
    let hello = first.outcomes[0].message.clone().unwrap();
    assert_eq!(hello.text, "hello");
    assert!(!hello.premium);
    assert_eq!(hello.sender, alice);

    let second = client
        .add_message(&bob, "world", Balance(20_000_000_000_000_000_000_000))
        .await
        .unwrap();
    let world = second.outcomes[0].message.clone().unwrap();

    let all = client.get_messages().await.unwrap();
    assert_eq!(all, vec![hello.clone(), world.clone()]);
    assert!(world.premium);
    assert_eq!(world.sender, bob);
    assert!(world.signed_date > hello.signed_date);
}

#[tokio::test]
async fn premium_boundary() {
    let node = TestNode::start().await;
    let client = node.client();
    let carol = account("carol");

    client
        .add_message(&carol, "at threshold", PREMIUM_THRESHOLD)
        .await
        .unwrap();
    client
        .add_message(&carol, "just under", Balance(PREMIUM_THRESHOLD.0 - 1))
        .await
        .unwrap();

    let all = client.get_messages().await.unwrap();
    assert!(all[0].premium);
    assert!(!all[1].premium);
}

#[tokio::test]
async fn forged_provenance_fields_are_ignored() {
    let node = TestNode::start().await;
    let body = serde_json::json!({
        "transactions": [{
            "signer_id": "alice",
            "receiver_id": "guestbook.test",
            "actions": [{
                "type": "FunctionCall",
                "params": {
                    "method_name": "addMessage",
                    "args": {
                        "text": "trust me",
                        "sender": "mallory",
                        "premium": true,
                        "signedDate": 1
                    },
                    "gas": 30_000_000_000_000u64,
                    "deposit": "0"
                }
            }]
        }]
    });
    let resp = reqwest::Client::new()
        .post(format!("{}/transactions", node.url()))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());

    let all = node.client().get_messages().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].text, "trust me");
    assert_eq!(all[0].sender, account("alice"));
    assert!(!all[0].premium);
    assert!(all[0].signed_date > 1);
}

#[tokio::test]
async fn reads_are_idempotent_and_growth_is_monotonic() {
    let node = TestNode::start().await;
    let client = node.client();
    let dave = account("dave");

    assert!(client.get_messages().await.unwrap().is_empty());
    for n in 1..=10 {
        client
            .add_message(&dave, &format!("entry {n}"), Balance::ZERO)
            .await
            .unwrap();
        let a = client.get_messages().await.unwrap();
        let b = client.get_messages().await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), n);
    }
    let texts: Vec<String> = client
        .get_messages()
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.text)
        .collect();
    let expected: Vec<String> = (1..=10).map(|n| format!("entry {n}")).collect();
    assert_eq!(texts, expected);
}

#[tokio::test]
async fn deposit_moves_to_contract() {
    let node = TestNode::start().await;
    let client = node.client();
    let erin = account("erin");

    let before = client.view_account(&erin).await.unwrap();
    assert_eq!(before.amount, Balance(100 * ONE_NEAR));
    let contract_before = client.view_account(&contract_id()).await.unwrap();

    client
        .add_message(&erin, "tip", Balance(ONE_NEAR))
        .await
        .unwrap();

    let after = client.view_account(&erin).await.unwrap();
    assert_eq!(after.amount, Balance(99 * ONE_NEAR));
    let contract_after = client.view_account(&contract_id()).await.unwrap();
    assert_eq!(
        contract_after.amount.0 - contract_before.amount.0,
        ONE_NEAR
    );
    assert!(after.block_height > before.block_height);
}

#[tokio::test]
async fn overdraft_leaves_ledger_untouched() {
    let node = TestNode::start().await;
    let client = node.client();
    let frank = account("frank");

    let err = client
        .add_message(&frank, "too rich", Balance(1_000 * ONE_NEAR))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Node { status: 402, .. }));
    assert!(client.get_messages().await.unwrap().is_empty());
    assert_eq!(
        client.view_account(&frank).await.unwrap().amount,
        Balance(100 * ONE_NEAR)
    );
}

#[tokio::test]
async fn app_flow_against_live_node() {
    let node = TestNode::start().await;
    let app = node.app();
    let alice = account("alice");

    assert!(matches!(
        app.add_message("anonymous", "").await,
        Err(AppError::NotSignedIn)
    ));

    app.sign_in(&alice).await.unwrap();
    app.refresh_messages().await;
    assert!(app.visible_messages().is_none());

    app.add_message("hello", "").await.unwrap();
    app.add_message("generous", "0.01").await.unwrap();

    let shown: Vec<PostedMessage> = app.visible_messages().unwrap();
    assert_eq!(shown.len(), 2);
    assert!(!shown[0].premium);
    assert!(shown[1].premium);

    app.sign_out();
    assert!(app.visible_messages().is_none());
}

#[tokio::test]
async fn ledger_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let node = TestNode::start_in(dir.path().to_path_buf()).await;
    {
        let client = node.client();
        client
            .add_message(&account("alice"), "still here", Balance::ZERO)
            .await
            .unwrap();
    }
    node.shutdown().await;

    let node = TestNode::start_in(dir.path().to_path_buf()).await;
    let client = node.client();
    let all = client.get_messages().await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].text, "still here");

    client
        .add_message(&account("bob"), "after restart", Balance::ZERO)
        .await
        .unwrap();
    let all = client.get_messages().await.unwrap();
    assert_eq!(all.len(), 2);
    assert!(all[1].signed_date > all[0].signed_date);
}
