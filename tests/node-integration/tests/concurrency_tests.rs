use std::collections::HashSet;

use guestbook_client::GuestbookApi;
use guestbook_common::balance::Balance;
use guestbook_node_integration::{account, TestNode};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_posts_all_land_once() {
    let node = TestNode::start().await;

    let mut tasks = Vec::new();
    for writer in 0..8 {
        let client = node.client();
        tasks.push(tokio::spawn(async move {
            let signer = account(&format!("writer{writer}"));
            for n in 0..5 {
                client
                    .add_message(&signer, &format!("{writer}-{n}"), Balance::ZERO)
                    .await
                    .unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let all = node.client().get_messages().await.unwrap();
    assert_eq!(all.len(), 40);

    let texts: HashSet<_> = all.iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts.len(), 40);

    // Timestamps follow ledger order.
    assert!(all.windows(2).all(|w| w[0].signed_date < w[1].signed_date));

    // Each writer's own posts keep their submission order.
    for writer in 0..8 {
        let sender = account(&format!("writer{writer}"));
        let own: Vec<_> = all
            .iter()
            .filter(|m| m.sender == sender)
            .map(|m| m.text.clone())
            .collect();
        let expected: Vec<_> = (0..5).map(|n| format!("{writer}-{n}")).collect();
        assert_eq!(own, expected);
    }
}
