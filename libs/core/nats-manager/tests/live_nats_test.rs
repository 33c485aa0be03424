//! Live tests against a real NATS server with JetStream
//!
//! Requires Docker. Run with `cargo test -- --ignored`.

use async_nats::HeaderMap;
use futures::StreamExt;
use nats_manager::*;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::nats::Nats;

struct LiveNats {
    _container: ContainerAsync<Nats>,
    client: async_nats::Client,
    manager: JetStreamManager,
}

async fn start_nats() -> LiveNats {
    let container = Nats::default()
        .with_tag("latest")
        .with_cmd(["-js"])
        .start()
        .await
        .expect("Failed to start NATS container");

    let port = container
        .get_host_port_ipv4(4222)
        .await
        .expect("Failed to get NATS port");

    let client = async_nats::connect(format!("nats://127.0.0.1:{port}"))
        .await
        .expect("Failed to connect to NATS");

    LiveNats {
        _container: container,
        manager: JetStreamManager::new(client.clone()),
        client,
    }
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_stream_and_consumer_round_trip() {
    let nats = start_nats().await;
    let manager = &nats.manager;

    let config = StreamConfig::new("ORDERS").with_subjects(["orders.>"]);
    let created = manager
        .add_stream(&config, &[ManageOpt::Retries(2)])
        .await
        .unwrap();
    assert_eq!(created.config.name, "ORDERS");

    let mut headers = HeaderMap::new();
    headers.insert("Nats-Msg-Id", "order-1");
    nats.client
        .publish_with_headers("orders.new", headers, "first".into())
        .await
        .unwrap();
    nats.client.publish("orders.new", "second".into()).await.unwrap();
    nats.client.flush().await.unwrap();

    let info = manager.stream_info("ORDERS", &[]).await.unwrap();
    assert_eq!(info.state.msgs, 2);

    let msg = manager.get_msg("ORDERS", 1, &[]).await.unwrap();
    assert_eq!(msg.data, b"first");
    assert_eq!(msg.headers.get("Nats-Msg-Id").unwrap(), "order-1");

    manager.delete_msg("ORDERS", 1, &[]).await.unwrap();

    let consumer = manager
        .add_consumer("ORDERS", Some(&ConsumerConfig::durable("dispatch")), &[])
        .await
        .unwrap();
    assert_eq!(consumer.name, "dispatch");

    let mut names = manager.consumer_names("ORDERS", &[]).unwrap();
    let mut listed = Vec::new();
    while let Some(name) = names.next().await {
        listed.push(name);
    }
    names.finish().await.unwrap();
    assert_eq!(listed, vec!["dispatch"]);

    assert_eq!(manager.purge_stream("ORDERS", &[]).await.unwrap(), 1);
    manager.delete_consumer("ORDERS", "dispatch", &[]).await.unwrap();
    manager.delete_stream("ORDERS", &[]).await.unwrap();
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_stream_listing() {
    let nats = start_nats().await;

    for i in 0..5 {
        let config = StreamConfig::new(format!("S{i}")).with_subjects([format!("s{i}.>")]);
        nats.manager.add_stream(&config, &[]).await.unwrap();
    }

    let mut streams = nats.manager.streams_info(&[]).unwrap();
    let mut count = 0;
    while streams.next().await.is_some() {
        count += 1;
    }
    streams.finish().await.unwrap();
    assert_eq!(count, 5);

    let account = nats.manager.account_info(&[]).await.unwrap();
    assert_eq!(account.streams, 5);
}
