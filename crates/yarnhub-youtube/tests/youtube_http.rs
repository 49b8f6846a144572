use std::time::Duration;

use httpmock::prelude::*;
use serde_json::json;
use yarnhub_youtube::{CommentApi, YouTubeClient, YouTubeError};

fn client(server: &MockServer) -> YouTubeClient {
    YouTubeClient::new(server.url("/youtube/v3"), "yt-key", "fHbuZwXIp04", Duration::from_secs(5))
        .unwrap()
}

#[tokio::test]
async fn latest_comment_queries_newest_thread() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET)
            .path("/youtube/v3/commentThreads")
            .query_param("part", "snippet")
            .query_param("videoId", "fHbuZwXIp04")
            .query_param("maxResults", "1")
            .query_param("order", "time")
            .query_param("key", "yt-key");
        then.status(200).json_body(json!({
            "items": [{
                "id": "UgxNewest",
                "snippet": {
                    "topLevelComment": {
                        "snippet": {
                            "textDisplay": "What size hook?",
                            "authorDisplayName": "@crochet",
                            "publishedAt": "2024-05-02T08:00:00Z"
                        }
                    }
                }
            }]
        }));
    });

    let comment = client(&server).latest_comment().await.unwrap().unwrap();

    mock.assert();
    assert_eq!(comment.id, "UgxNewest");
    assert_eq!(comment.text, "What size hook?");
    assert_eq!(comment.author, "@crochet");
    assert!(comment.published_at.is_some());
}

#[tokio::test]
async fn video_without_comments_is_none() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/youtube/v3/commentThreads");
        then.status(200).json_body(json!({"items": []}));
    });

    assert!(client(&server).latest_comment().await.unwrap().is_none());
}

#[tokio::test]
async fn post_reply_sends_parent_and_text() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/youtube/v3/comments")
            .query_param("part", "snippet")
            .query_param("key", "yt-key")
            .json_body(json!({
                "snippet": {"parentId": "UgxNewest", "textOriginal": "A 5mm hook works well."}
            }));
        then.status(200).json_body(json!({"id": "UgxNewest.reply1"}));
    });

    client(&server)
        .post_reply("UgxNewest", "A 5mm hook works well.")
        .await
        .unwrap();

    mock.assert();
}

#[tokio::test]
async fn access_token_is_sent_as_bearer() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/youtube/v3/comments")
            .header("authorization", "Bearer ya29.token");
        then.status(200).json_body(json!({"id": "r1"}));
    });

    client(&server)
        .with_access_token("ya29.token")
        .post_reply("c1", "thanks!")
        .await
        .unwrap();

    mock.assert();
}

#[tokio::test]
async fn forbidden_insert_is_api_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/youtube/v3/comments");
        then.status(403)
            .json_body(json!({"error": {"code": 403, "message": "insufficientPermissions"}}));
    });

    let err = client(&server).post_reply("c1", "hi").await.unwrap_err();

    match err {
        YouTubeError::Api { status, message } => {
            assert_eq!(status, 403);
            assert!(message.contains("insufficientPermissions"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn garbage_body_is_parse_error() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/youtube/v3/commentThreads");
        then.status(200).body("<html>quota page</html>");
    });

    let err = client(&server).latest_comment().await.unwrap_err();

    assert!(matches!(err, YouTubeError::Parse(_)));
}
