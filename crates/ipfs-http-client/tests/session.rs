mod common;

use std::time::Duration;

use futures::StreamExt;
use http::{Method, StatusCode};
use ipfs_http_client::{
    ApiRequest, CallOptions, ClientError, DecodeError, VersionInfo, VersionRange, connect_with,
};

use common::{MockConnector, MockReply, config, mock_client, uri};

#[tokio::test]
async fn calls_without_session_open_their_own_connection() {
    let (client, connector) = mock_client();
    connector.client.push(MockReply::version("0.5.1")).await;
    connector.client.push(MockReply::version("0.5.1")).await;

    client.version().await.unwrap();
    client.version().await.unwrap();

    assert_eq!(connector.one_shot(), 2);
    assert_eq!(connector.pooled(), 0);
}

#[tokio::test]
async fn session_calls_share_one_connection() {
    let (client, connector) = mock_client();
    for _ in 0..3 {
        connector.client.push(MockReply::version("0.5.1")).await;
    }

    {
        let session = client.session().unwrap();
        assert!(session.has_session());
        session.version().await.unwrap();
        session.version().await.unwrap();
    }
    assert_eq!(connector.pooled(), 1);
    assert_eq!(connector.one_shot(), 0);

    // Released on drop; the next call goes back to one-shot connections.
    assert!(!client.has_session());
    client.version().await.unwrap();
    assert_eq!(connector.one_shot(), 1);
}

#[tokio::test]
async fn session_open_and_close_are_idempotent() {
    let (client, connector) = mock_client();

    client.open_session().unwrap();
    client.open_session().unwrap();
    assert_eq!(connector.pooled(), 1);
    assert!(client.has_session());

    client.close();
    client.close();
    assert!(!client.has_session());
}

#[tokio::test]
async fn session_from_config_is_open_right_away() {
    let config = config();
    let config = ipfs_http_client::ClientConfig { session: true, ..config };
    let (client, connector) = common::mock_client_with(config);
    assert!(client.has_session());
    assert_eq!(connector.pooled(), 1);
}

#[tokio::test]
async fn session_released_when_scope_fails() {
    let (client, connector) = mock_client();
    connector
        .client
        .push(MockReply::body(StatusCode::NOT_FOUND, "404 page not found"))
        .await;

    let result: ipfs_http_client::Result<VersionInfo> = async {
        let session = client.session()?;
        let info = session.version().await?;
        Ok(info)
    }
    .await;

    assert!(result.is_err());
    assert!(!client.has_session());
}

#[tokio::test]
async fn explicit_guard_close() {
    let (client, _connector) = mock_client();
    let session = client.session().unwrap();
    session.close();
    assert!(!client.has_session());
}

#[tokio::test]
async fn connect_refuses_unsupported_daemon() {
    for reported in ["0.6.0", "0.4.20", "0.3.11"] {
        let connector = MockConnector::default();
        connector.client.push(MockReply::version(reported)).await;

        let result = connect_with(connector, config(), &VersionRange::default()).await;
        match result {
            Err(ClientError::VersionMismatch(e)) => {
                assert_eq!(e.current.to_string(), reported);
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("{reported} should have been refused"),
        }
    }
}

#[tokio::test]
async fn connect_accepts_supported_daemon() {
    for reported in ["0.4.21", "0.5.0", "0.5.0-dev", "0.5.1"] {
        let connector = MockConnector::default();
        connector.client.push(MockReply::version(reported)).await;
        let client = connect_with(connector.clone(), config(), &VersionRange::default())
            .await
            .unwrap();
        assert!(!client.has_session());

        let log = connector.client.take_log().await;
        assert_eq!(log.len(), 1);
        assert_eq!(
            uri(&log[0]),
            "http://127.0.0.1:5001/api/v0/version?stream-channels=true"
        );
    }
}

#[tokio::test]
async fn connect_honours_blacklist() {
    let range = VersionRange::default().blacklist("0.5.1").unwrap();
    let connector = MockConnector::default();
    connector.client.push(MockReply::version("0.5.1-rc1")).await;
    let result = connect_with(connector, config(), &range).await;
    assert!(matches!(result, Err(ClientError::VersionMismatch(_))));
}

#[tokio::test]
async fn old_daemon_gets_head_for_result_less_calls() {
    let connector = MockConnector::default();
    connector.client.push(MockReply::version("0.4.23")).await;
    let client = connect_with(connector.clone(), config(), &VersionRange::default())
        .await
        .unwrap();
    connector.client.take_log().await;

    connector.client.push(MockReply::empty()).await;
    connector.client.push(MockReply::empty()).await;
    let discard = CallOptions::builder().discard_result(true).build();

    client
        .call(ApiRequest::new("pubsub/pub").arg("t").arg("hi"))
        .options(discard)
        .discard()
        .await
        .unwrap();
    client
        .call(ApiRequest::new("pubsub/pub").arg("t").arg("hi"))
        .discard()
        .await
        .unwrap();

    let log = connector.client.take_log().await;
    assert_eq!(log[0].method(), Method::HEAD);
    assert_eq!(log[1].method(), Method::POST);
}

#[tokio::test]
async fn current_daemon_always_gets_post() {
    let connector = MockConnector::default();
    connector.client.push(MockReply::version("0.5.1")).await;
    let client = connect_with(connector.clone(), config(), &VersionRange::default())
        .await
        .unwrap();
    connector.client.take_log().await;

    connector.client.push(MockReply::empty()).await;
    client
        .call(ApiRequest::new("pubsub/pub").arg("t").arg("hi"))
        .options(CallOptions::builder().discard_result(true).build())
        .discard()
        .await
        .unwrap();
    let log = connector.client.take_log().await;
    assert_eq!(log[0].method(), Method::POST);
}

#[tokio::test]
async fn daemon_error_payload_maps_to_error_response() {
    let (client, connector) = mock_client();
    connector
        .client
        .push(MockReply::body(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"Message":"invalid path \"nope\": selected encoding not supported","Code":0,"Type":"error"}"#,
        ))
        .await;

    let err = client.cat("nope").await.unwrap_err();
    let response = err.error_response().expect("structured error");
    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.message.starts_with("invalid path"));
    assert_eq!(response.kind, "error");
}

#[tokio::test]
async fn bare_status_maps_to_status_error() {
    let (client, connector) = mock_client();
    connector
        .client
        .push(MockReply::body(StatusCode::NOT_FOUND, "404 page not found"))
        .await;
    match client.version().await.unwrap_err() {
        ClientError::Status(e) => {
            assert_eq!(e.status, StatusCode::NOT_FOUND);
            assert_eq!(e.body.as_deref(), Some(&b"404 page not found"[..]));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn garbage_success_body_is_protocol_error() {
    let (client, connector) = mock_client();
    connector
        .client
        .push(MockReply::body(StatusCode::OK, "<html>hello</html>"))
        .await;
    assert!(matches!(
        client.version().await,
        Err(ClientError::Protocol(DecodeError::Json(_)))
    ));

    connector
        .client
        .push(MockReply::body(
            StatusCode::OK,
            r#"{"Version":"0.5.1","Commit":""}<html>oops"#,
        ))
        .await;
    assert!(matches!(
        client.version().await,
        Err(ClientError::Protocol(DecodeError::Json(_)))
    ));

    connector.client.push(MockReply::empty()).await;
    assert!(matches!(
        client.version().await,
        Err(ClientError::Protocol(DecodeError::Empty))
    ));
}

#[tokio::test]
async fn slow_reply_times_out() {
    let (client, connector) = mock_client();
    connector
        .client
        .push(MockReply::version("0.5.1").delayed(Duration::from_millis(500)))
        .await;

    let err = client
        .call(ApiRequest::new("version"))
        .timeout(Duration::from_millis(20))
        .single::<VersionInfo>()
        .await
        .unwrap_err();
    assert!(err.is_timeout());
}

#[tokio::test]
async fn stalled_error_body_times_out() {
    let (client, connector) = mock_client();
    connector
        .client
        .push(MockReply::stalled(StatusCode::INTERNAL_SERVER_ERROR, r#"{"Mess"#))
        .await;

    let call = client
        .call(ApiRequest::new("log/tail"))
        .timeout(Duration::from_millis(50))
        .byte_stream();
    let result = tokio::time::timeout(Duration::from_secs(2), call)
        .await
        .expect("call outlived its own deadline");
    let Err(err) = result else {
        panic!("error status must not yield a stream");
    };
    assert!(err.is_timeout());
}

#[tokio::test]
async fn stalled_stream_times_out_between_chunks() {
    let (client, connector) = mock_client();
    connector
        .client
        .push(MockReply::stalled(StatusCode::OK, "{\"Seq\":1}\n"))
        .await;

    let mut events = client
        .call(ApiRequest::new("log/tail"))
        .timeout(Duration::from_millis(50))
        .stream::<serde_json::Value>()
        .await
        .unwrap();
    let first = events.next().await.unwrap().unwrap();
    assert_eq!(first["Seq"], 1);

    let next = tokio::time::timeout(Duration::from_secs(2), events.next())
        .await
        .expect("stream outlived its own deadline");
    assert!(next.unwrap().unwrap_err().is_timeout());
    assert!(events.next().await.is_none());
}

#[tokio::test]
async fn refused_connection_maps_to_connection_error() {
    let (client, connector) = mock_client();
    connector.client.push(MockReply::refused()).await;
    assert!(matches!(
        client.id(None).await,
        Err(ClientError::Connection(_))
    ));
}
