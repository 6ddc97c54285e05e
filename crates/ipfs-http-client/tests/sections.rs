mod common;

use futures::StreamExt;
use http::header::{AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue};
use ipfs_http_client::section::files::WriteOptions;
use ipfs_http_client::section::pin::PinKind;
use ipfs_http_client::{
    AddOptions, BasicAuth, CallOptions, ClientConfig, ClientError, DecodeError,
};
use serde_json::json;

use common::{MockReply, config, mock_client, mock_client_with, uri};

const BASE: &str = "http://127.0.0.1:5001/api/v0";

#[tokio::test]
async fn pin_add_request_shape() {
    let (client, connector) = mock_client();
    connector
        .client
        .push(MockReply::json(json!({"Pins": ["QmA", "QmB"]})))
        .await;

    let pins = client.pin().add(["QmA", "QmB"], true).await.unwrap();
    assert_eq!(pins, ["QmA", "QmB"]);

    let log = connector.client.take_log().await;
    assert_eq!(log[0].method(), http::Method::POST);
    assert_eq!(
        uri(&log[0]),
        format!("{BASE}/pin/add?arg=QmA&arg=QmB&recursive=true&stream-channels=true")
    );
}

#[tokio::test]
async fn pin_ls_keys_by_cid() {
    let (client, connector) = mock_client();
    connector
        .client
        .push(MockReply::json(json!({
            "Keys": {
                "QmA": {"Type": "recursive"},
                "QmB": {"Type": "recursive"}
            }
        })))
        .await;
    connector.client.push(MockReply::json(json!({"Keys": null}))).await;

    let pins = client.pin().ls(PinKind::Recursive).await.unwrap();
    assert_eq!(pins.len(), 2);
    assert_eq!(pins["QmB"].kind, "recursive");
    assert!(client.pin().ls(PinKind::All).await.unwrap().is_empty());

    let log = connector.client.take_log().await;
    assert_eq!(
        uri(&log[0]),
        format!("{BASE}/pin/ls?type=recursive&stream-channels=true")
    );
}

#[tokio::test]
async fn defaults_and_section_options_are_layered() {
    let defaults = CallOptions::builder()
        .offline(true)
        .auth(BasicAuth::new("admin", "secret"))
        .build()
        .header(HeaderName::from_static("x-default"), HeaderValue::from_static("1"));
    let config = ClientConfig {
        defaults,
        ..config()
    };
    let (client, connector) = mock_client_with(config);
    connector.client.push(MockReply::json(json!({"Strings": ["/ip4/1.2.3.4/tcp/4001/p2p/QmPeer success"]}))).await;

    let swarm = client.swarm().with_options(
        CallOptions::default()
            .header(HeaderName::from_static("x-section"), HeaderValue::from_static("2")),
    );
    swarm
        .connect(["/ip4/1.2.3.4/tcp/4001/p2p/QmPeer"])
        .await
        .unwrap();

    let log = connector.client.take_log().await;
    let request = &log[0];
    assert!(uri(request).ends_with("stream-channels=true&offline=true"));
    assert_eq!(request.headers()["x-default"], "1");
    assert_eq!(request.headers()["x-section"], "2");
    assert!(request.headers().contains_key(AUTHORIZATION));
}

#[tokio::test]
async fn section_options_can_switch_default_flags_off() {
    let config = ClientConfig {
        defaults: CallOptions::builder().offline(true).build(),
        ..config()
    };
    let (client, connector) = mock_client_with(config);
    for _ in 0..2 {
        connector.client.push(MockReply::json(json!({"Strings": []}))).await;
    }

    let peer = ["/ip4/1.2.3.4/tcp/4001/p2p/QmPeer"];
    client
        .swarm()
        .with_options(CallOptions::builder().offline(false).build())
        .connect(peer)
        .await
        .unwrap();
    client
        .swarm()
        .with_options(CallOptions::default())
        .connect(peer)
        .await
        .unwrap();

    let log = connector.client.take_log().await;
    assert!(uri(&log[0]).ends_with("stream-channels=true"));
    assert!(uri(&log[1]).ends_with("stream-channels=true&offline=true"));
}

#[tokio::test]
async fn uploads_are_streamed_in_chunk_size_pieces() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, "0123456789").unwrap();

    let config = ClientConfig {
        chunk_size: 4,
        ..config()
    };
    let (client, connector) = mock_client_with(config);
    connector
        .client
        .push(MockReply::json(json!({"Name": "notes.txt", "Hash": "QmNotes", "Size": "18"})))
        .await;
    connector
        .client
        .push(MockReply::json(json!({"Name": "QmBytes", "Hash": "QmBytes", "Size": "17"})))
        .await;

    let added = client.add([&path], &AddOptions::default()).await.unwrap();
    assert_eq!(added[0].hash, "QmNotes");
    assert_eq!(client.add_bytes(&b"abcdefghi"[..]).await.unwrap(), "QmBytes");

    // part head, content pieces, part terminator, closing boundary
    let uploads = connector.client.take_uploads().await;
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0].len(), 6);
    assert_eq!(uploads[0][1..4], [4, 4, 2]);
    assert_eq!(uploads[1][1..4], [4, 4, 1]);

    let log = connector.client.take_log().await;
    let body = String::from_utf8(log[0].body().clone()).unwrap();
    assert!(body.contains("filename=\"notes.txt\""));
    assert!(body.contains("\r\n\r\n0123456789\r\n"));
}

#[tokio::test]
async fn swarm_filters_and_object_patch_paths() {
    let (client, connector) = mock_client();
    connector
        .client
        .push(MockReply::json(json!({"Strings": ["/ip4/10.0.0.0/ipcidr/8"]})))
        .await;
    connector
        .client
        .push(MockReply::json(json!({"Hash": "QmNew", "Links": null})))
        .await;

    let added = client
        .swarm()
        .filters()
        .add(["/ip4/10.0.0.0/ipcidr/8"])
        .await
        .unwrap();
    assert_eq!(added, ["/ip4/10.0.0.0/ipcidr/8"]);

    let node = client
        .object()
        .patch()
        .add_link("QmRoot", "child", "QmChild", false)
        .await
        .unwrap();
    assert_eq!(node.hash, "QmNew");
    assert!(node.links.is_empty());

    let log = connector.client.take_log().await;
    assert!(uri(&log[0]).starts_with(&format!("{BASE}/swarm/filters/add?arg=%2Fip4%2F10.0.0.0")));
    assert_eq!(
        uri(&log[1]),
        format!(
            "{BASE}/object/patch/add-link?arg=QmRoot&arg=child&arg=QmChild&create=false&stream-channels=true"
        )
    );
}

#[tokio::test]
async fn files_write_uploads_multipart() {
    let (client, connector) = mock_client();
    connector.client.push(MockReply::empty()).await;

    let options = WriteOptions::builder().create(true).parents(true).build();
    client
        .files()
        .write("/docs/readme.txt", "hello mfs", &options)
        .await
        .unwrap();

    let log = connector.client.take_log().await;
    let request = &log[0];
    let query = request.uri().query().unwrap();
    assert!(query.starts_with("arg=%2Fdocs%2Freadme.txt&create=true&truncate=false&parents=true"));
    let content_type = request.headers()[CONTENT_TYPE].to_str().unwrap();
    assert!(content_type.starts_with("multipart/form-data; boundary="));
    let body = String::from_utf8(request.body().clone()).unwrap();
    assert!(body.contains("Content-Disposition: form-data; name=\"file\""));
    assert!(body.contains("\r\n\r\nhello mfs\r\n"));
}

#[tokio::test]
async fn config_set_encodes_non_strings_as_json() {
    let (client, connector) = mock_client();
    connector
        .client
        .push(MockReply::json(json!({"Key": "Datastore.StorageMax", "Value": "20GB"})))
        .await;
    connector
        .client
        .push(MockReply::json(json!({"Key": "Swarm.DisableNatPortMap", "Value": true})))
        .await;

    client
        .config()
        .set("Datastore.StorageMax", &json!("20GB"))
        .await
        .unwrap();
    let entry = client
        .config()
        .set("Swarm.DisableNatPortMap", &json!(true))
        .await
        .unwrap();
    assert_eq!(entry.value, json!(true));

    let log = connector.client.take_log().await;
    assert_eq!(
        uri(&log[0]),
        format!("{BASE}/config?arg=Datastore.StorageMax&arg=20GB&stream-channels=true")
    );
    assert_eq!(
        uri(&log[1]),
        format!("{BASE}/config?arg=Swarm.DisableNatPortMap&arg=true&json=true&stream-channels=true")
    );
}

#[tokio::test]
async fn dht_get_picks_value_event() {
    let (client, connector) = mock_client();
    connector
        .client
        .push(MockReply::chunks(&[
            "{\"ID\":\"QmA\",\"Type\":6,\"Responses\":null,\"Extra\":\"\"}\n",
            "{\"ID\":\"QmB\",\"Type\":5,\"Responses\":null,\"Extra\":\"the value\"}\n",
        ]))
        .await;
    connector
        .client
        .push(MockReply::chunks(&["{\"ID\":\"QmA\",\"Type\":3,\"Extra\":\"routing: not found\"}\n"]))
        .await;

    assert_eq!(client.dht().get("/ipns/key").await.unwrap(), "the value");
    assert!(matches!(
        client.dht().get("/ipns/key").await,
        Err(ClientError::Protocol(DecodeError::MissingField("Extra")))
    ));
}

#[tokio::test]
async fn pubsub_subscription_yields_messages_across_chunks() {
    let (client, connector) = mock_client();
    connector
        .client
        .push(MockReply::chunks(&[
            "{}\n{\"from\":\"EiBm\",\"data\":\"aGVs",
            "bG8=\",\"seqno\":\"AQ==\",\"topicIDs\":[\"chat\"]}\n",
            "{\"from\":\"EiBm\",\"data\":\"YnllIQ==\",\"seqno\":\"Ag==\",\"topicIDs\":[\"chat\"]}\n",
        ]))
        .await;

    let stream = client.pubsub().subscribe("chat", false).await.unwrap();
    let messages: Vec<_> = stream.collect().await;
    assert_eq!(messages.len(), 3);
    let hello = messages[1].as_ref().unwrap();
    assert_eq!(hello.data().unwrap(), b"hello");
    assert_eq!(hello.seqno().unwrap(), 1);
    let bye = messages[2].as_ref().unwrap();
    assert_eq!(bye.data().unwrap(), b"bye!");

    let log = connector.client.take_log().await;
    assert_eq!(
        uri(&log[0]),
        format!("{BASE}/pubsub/sub?arg=chat&discover=false&stream-channels=true")
    );
}

#[tokio::test]
async fn ping_stream_reports_truncated_tail() {
    let (client, connector) = mock_client();
    connector
        .client
        .push(MockReply::chunks(&[
            "{\"Success\":true,\"Time\":0,\"Text\":\"Looking up peer QmPeer\"}\n",
            "{\"Success\":true,\"Time\":1534000,\"Text\":\"\"}\n{\"Success\":tr",
        ]))
        .await;

    let replies: Vec<_> = client.ping("QmPeer", 2).await.unwrap().collect().await;
    assert_eq!(replies.len(), 3);
    assert_eq!(replies[1].as_ref().unwrap().time, 1_534_000);
    assert!(matches!(
        replies[2],
        Err(ClientError::Protocol(DecodeError::Truncated))
    ));
}

#[tokio::test]
async fn streaming_call_rejected_by_daemon() {
    let (client, connector) = mock_client();
    connector
        .client
        .push(MockReply::body(
            http::StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"Message":"experimental pubsub feature not enabled","Code":0,"Type":"error"}"#,
        ))
        .await;

    let err = client.pubsub().subscribe("chat", false).await.err().unwrap();
    assert_eq!(
        err.error_response().unwrap().message,
        "experimental pubsub feature not enabled"
    );
}

#[tokio::test]
async fn unstable_log_and_refs() {
    let (client, connector) = mock_client();
    connector
        .client
        .push(MockReply::json(json!({"Message": "Changed log level of 'all' to 'debug'\n"})))
        .await;
    connector
        .client
        .push(MockReply::chunks(&[
            "{\"Ref\":\"QmA\",\"Err\":\"\"}\n{\"Ref\":\"QmB\",\"Err\":\"\"}\n",
        ]))
        .await;

    let message = client.unstable().log().level("all", "debug").await.unwrap();
    assert!(message.contains("debug"));
    let refs = client.unstable().refs_local().await.unwrap();
    let cids: Vec<_> = refs.iter().map(|r| r.cid.as_str()).collect();
    assert_eq!(cids, ["QmA", "QmB"]);

    let log = connector.client.take_log().await;
    assert_eq!(
        uri(&log[0]),
        format!("{BASE}/log/level?arg=all&arg=debug&stream-channels=true")
    );
    assert_eq!(uri(&log[1]), format!("{BASE}/refs/local?stream-channels=true"));
}

#[tokio::test]
async fn root_calls() {
    let (client, connector) = mock_client();
    connector
        .client
        .push(MockReply::json(json!({
            "ID": "QmPeer",
            "PublicKey": "CAASpgIw",
            "Addresses": null,
            "AgentVersion": "go-ipfs/0.5.1/",
            "ProtocolVersion": "ipfs/0.1.0"
        })))
        .await;
    connector.client.push(MockReply::body(http::StatusCode::OK, "hello")).await;
    connector
        .client
        .push(MockReply::json(json!({"Path": "/ipfs/QmTarget"})))
        .await;
    connector.client.push(MockReply::empty()).await;

    let id = client.id(None).await.unwrap();
    assert_eq!(id.id, "QmPeer");
    assert!(id.addresses.is_empty());
    assert_eq!(&client.cat_range("QmFile", 6, Some(5)).await.unwrap()[..], b"hello");
    assert_eq!(
        client.resolve("/ipns/example.com", true).await.unwrap(),
        "/ipfs/QmTarget"
    );
    client.stop().await.unwrap();

    let log = connector.client.take_log().await;
    assert_eq!(
        uri(&log[1]),
        format!("{BASE}/cat?arg=QmFile&offset=6&length=5&stream-channels=true")
    );
    assert_eq!(uri(&log[3]), format!("{BASE}/shutdown?stream-channels=true"));
}

#[tokio::test]
async fn add_json_uploads_serialized_value() {
    let (client, connector) = mock_client();
    connector
        .client
        .push(MockReply::json(json!({"Name": "QmJson", "Hash": "QmJson", "Size": "21"})))
        .await;

    let cid = client.add_json(&json!({"one": 1, "two": [2]})).await.unwrap();
    assert_eq!(cid, "QmJson");

    let log = connector.client.take_log().await;
    let body = String::from_utf8(log[0].body().clone()).unwrap();
    assert!(body.contains(r#"{"one":1,"two":[2]}"#));
    assert!(body.contains("Content-Type: application/octet-stream"));
}
