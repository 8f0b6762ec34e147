//! Integration tests against a mocked EaaS deployment

use serde_json::{Value, json};
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use eaas::config::Config;
use eaas::{
    AnnotationData, EmotionApi, Error, InputNaming, JobStatus, JobUpdate, NewEntry, NewJob,
    SESSION_METRICS_CONTENT_TYPE,
};

const BASIC_AUTH: &str = "Basic dXNlcjpwYXNz"; // user:pass

fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default();
    config.service.discovery_url = server.uri();
    config.credentials.username = Some("user".into());
    config.credentials.password = Some("pass".into());
    config
}

async fn mount_discovery(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "v1": {
                "jobs": format!("{}/jobs", server.uri()),
                "entries": format!("{}/entries", server.uri())
            }
        })))
        .mount(server)
        .await;
}

/// Mock server with discovery mounted and a connected client
async fn setup() -> (MockServer, EmotionApi) {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    let api = EmotionApi::from_config(&test_config(&server))
        .await
        .expect("Failed to connect test client");
    (server, api)
}

fn write_media(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("Failed to write test media");
    path
}

fn completed_job(uri: &str) -> Value {
    json!({
        "self": format!("{}/jobs/42", uri),
        "status": "complete",
        "name": "multiface",
        "input": {
            "self": format!("{}/entries/7", uri),
            "representations": [
                {
                    "file_name": "clip.mp4",
                    "content_type": "video/mp4",
                    "media": format!("{}/media/input", uri)
                }
            ]
        },
        "result": {
            "representations": [
                {
                    "file_name": "results.csv",
                    "content_type": "application/csv",
                    "media": format!("{}/media/csv", uri)
                },
                {
                    "file_name": "session.json",
                    "content_type": SESSION_METRICS_CONTENT_TYPE,
                    "media": format!("{}/media/session", uri)
                }
            ]
        }
    })
}

async fn mount_job(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/jobs/42"))
        .and(header("authorization", BASIC_AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// `METHOD /path` of every call after discovery, in arrival order
async fn api_calls(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path() != "/")
        .map(|r| format!("{} {}", r.method, r.url.path()))
        .collect()
}

mod discovery_tests {
    use super::*;

    #[tokio::test]
    async fn test_client_resolves_index() {
        let (server, api) = setup().await;
        assert_eq!(api.index().jobs(), format!("{}/jobs", server.uri()));
        assert_eq!(
            api.index().entries(),
            Some(format!("{}/entries", server.uri()).as_str())
        );
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let mut config = test_config(&server);
        config.credentials.password = None;

        let err = EmotionApi::from_config(&config).await.unwrap_err();
        assert!(matches!(err, Error::Configuration(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_absent_version_is_discovery_error() {
        let server = MockServer::start().await;
        mount_discovery(&server).await;

        let mut config = test_config(&server);
        config.service.version = "v2".into();

        let err = EmotionApi::from_config(&config).await.unwrap_err();
        assert!(matches!(err, Error::ServiceDiscovery(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_discovery_error_status_is_request_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .mount(&server)
            .await;

        let err = EmotionApi::from_config(&test_config(&server))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(503));
    }
}

mod job_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_job_streams_multipart() {
        let (server, api) = setup().await;
        let dir = TempDir::new().unwrap();
        let media = write_media(&dir, "clip.mp4", b"fake video bytes");

        Mock::given(method("POST"))
            .and(path("/jobs"))
            .and(header("authorization", BASIC_AUTH))
            .and(header("accept", "application/json"))
            .and(body_string_contains(r#"name="entry_job[name]""#))
            .and(body_string_contains("multiface"))
            .and(body_string_contains(r#"name="entry_job[input]"; filename="clip.mp4""#))
            .and(body_string_contains("video/mp4"))
            .and(body_string_contains("fake video bytes"))
            .and(body_string_contains(r#"name="entry[data_split]""#))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "self": format!("{}/jobs/42", server.uri()),
                "status": "queued",
                "name": "multiface"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = NewJob::builder()
            .media_path(media)
            .extra_fields(vec![("entry[data_split]".into(), "train".into())])
            .build();
        let job = api.create_job(&request).await.unwrap();

        assert_eq!(job.status(), &JobStatus::Queued);
        assert_eq!(job.id(), "42");
    }

    #[tokio::test]
    async fn test_create_job_missing_file_is_upload_error() {
        let (server, api) = setup().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let request = NewJob::builder().media_path("/nonexistent/clip.mp4").build();
        let err = api.create_job(&request).await.unwrap_err();
        assert!(matches!(err, Error::Upload { .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_create_job_rejected_is_request_error() {
        let (server, api) = setup().await;
        let dir = TempDir::new().unwrap();
        let media = write_media(&dir, "clip.mp4", b"bytes");

        Mock::given(method("POST"))
            .and(path("/jobs"))
            .respond_with(ResponseTemplate::new(422).set_body_string(r#"{"error":"bad name"}"#))
            .mount(&server)
            .await;

        let request = NewJob::builder().media_path(media).name("bogus").build();
        match api.create_job(&request).await {
            Err(Error::Request { status, body, .. }) => {
                assert_eq!(status, 422);
                assert!(body.contains("bad name"));
            }
            other => panic!("Expected Request error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_query_job_error_status() {
        let (server, api) = setup().await;
        Mock::given(method("GET"))
            .and(path("/jobs/404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = api
            .query_job(&format!("{}/jobs/404", server.uri()))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
    }

    #[tokio::test]
    async fn test_list_jobs() {
        let (server, api) = setup().await;
        Mock::given(method("GET"))
            .and(path("/jobs"))
            .and(header("authorization", BASIC_AUTH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"self": format!("{}/jobs/1", server.uri()), "status": "complete", "filename": "a.mp4"},
                {"self": format!("{}/jobs/2", server.uri()), "status": "queued", "filename": "b.mp4"}
            ])))
            .mount(&server)
            .await;

        let jobs = api.jobs().await.unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].status, JobStatus::Complete);
        assert_eq!(jobs[1].filename.as_deref(), Some("b.mp4"));
    }

    #[tokio::test]
    async fn test_requeue_posts_to_sub_path() {
        let (server, api) = setup().await;

        Mock::given(method("POST"))
            .and(path("/jobs/42/requeue"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "self": format!("{}/jobs/42", server.uri()),
                "status": "queued"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let job = api
            .requeue_job(&format!("{}/jobs/42", server.uri()))
            .await
            .unwrap();
        assert_eq!(job.status(), &JobStatus::Queued);
        assert_eq!(api_calls(&server).await, ["POST /jobs/42/requeue"]);
    }

    #[tokio::test]
    async fn test_requeue_does_not_depend_on_job_payload() {
        let (server, api) = setup().await;
        Mock::given(method("GET"))
            .and(path("/jobs/42"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not a job"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/jobs/42/requeue"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "self": format!("{}/jobs/42", server.uri()),
                "status": "queued"
            })))
            .expect(1)
            .mount(&server)
            .await;

        api.requeue_job(&format!("{}/jobs/42", server.uri()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_sends_only_provided_fields() {
        let (server, api) = setup().await;
        mount_job(&server, completed_job(&server.uri())).await;

        Mock::given(method("PATCH"))
            .and(path("/jobs/42"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"entry_job": {"name": "face"}})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let update = JobUpdate {
            name: Some("face".into()),
        };
        let job = api
            .update_job(&format!("{}/jobs/42", server.uri()), &update)
            .await
            .unwrap();

        // 204 falls back to re-querying the job
        assert_eq!(job.status(), &JobStatus::Complete);
        assert_eq!(api_calls(&server).await, ["PATCH /jobs/42", "GET /jobs/42"]);
    }

    #[tokio::test]
    async fn test_query_job_tolerates_null_descriptor_fields() {
        let (server, api) = setup().await;
        mount_job(
            &server,
            json!({
                "self": format!("{}/jobs/42", server.uri()),
                "status": "complete",
                "result": {"representations": [
                    {"file_name": null, "content_type": "application/csv", "media": "x"}
                ]}
            }),
        )
        .await;

        let job = api
            .query_job(&format!("{}/jobs/42", server.uri()))
            .await
            .unwrap();
        assert!(job.status().is_complete());
    }

    #[tokio::test]
    async fn test_download_result_streams_to_output_dir() {
        let (server, api) = setup().await;
        mount_job(&server, completed_job(&server.uri())).await;

        let csv = "TimeStamp,joy\n0.0,0.5\n";
        Mock::given(method("GET"))
            .and(path("/media/csv"))
            .and(header("authorization", BASIC_AUTH))
            .respond_with(ResponseTemplate::new(200).set_body_string(csv))
            .expect(1)
            .mount(&server)
            .await;

        let output = TempDir::new().unwrap();
        let local = api
            .download_results(
                &format!("{}/jobs/42", server.uri()),
                "application/csv",
                output.path(),
            )
            .await
            .unwrap();

        assert_eq!(local, output.path().join("results.csv"));
        assert_eq!(std::fs::read_to_string(&local).unwrap(), csv);
    }

    #[tokio::test]
    async fn test_download_result_unknown_content_type() {
        let (server, api) = setup().await;
        mount_job(&server, completed_job(&server.uri())).await;

        let output = TempDir::new().unwrap();
        let err = api
            .download_results(&format!("{}/jobs/42", server.uri()), "text/plain", output.path())
            .await
            .unwrap_err();

        match err {
            Error::ContentTypeNotFound { requested, available } => {
                assert_eq!(requested, "text/plain");
                assert_eq!(available, vec!["application/csv", SESSION_METRICS_CONTENT_TYPE]);
            }
            other => panic!("Expected ContentTypeNotFound, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_download_result_before_completion() {
        let (server, api) = setup().await;
        mount_job(
            &server,
            json!({"self": format!("{}/jobs/42", server.uri()), "status": "processing"}),
        )
        .await;

        let output = TempDir::new().unwrap();
        let err = api
            .download_results(&format!("{}/jobs/42", server.uri()), "application/csv", output.path())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ContentTypeNotFound { .. }), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_failed_download_removes_partial_file() {
        let (server, api) = setup().await;
        mount_job(&server, completed_job(&server.uri())).await;

        Mock::given(method("GET"))
            .and(path("/media/csv"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let output = TempDir::new().unwrap();
        let err = api
            .download_results(&format!("{}/jobs/42", server.uri()), "application/csv", output.path())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(500));
        assert!(!output.path().join("results.csv").exists());
        assert!(!output.path().join(".results.csv.part").exists());
    }

    #[tokio::test]
    async fn test_failed_download_keeps_existing_file() {
        let (server, api) = setup().await;
        mount_job(&server, completed_job(&server.uri())).await;

        Mock::given(method("GET"))
            .and(path("/media/csv"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let output = TempDir::new().unwrap();
        let existing = write_media(&output, "results.csv", b"previous good results");

        let err = api
            .download_results(&format!("{}/jobs/42", server.uri()), "application/csv", output.path())
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(503));
        assert_eq!(std::fs::read(&existing).unwrap(), b"previous good results");
    }

    #[tokio::test]
    async fn test_download_result_resolves_linked_representation() {
        let (server, api) = setup().await;
        mount_job(
            &server,
            json!({
                "self": format!("{}/jobs/42", server.uri()),
                "status": "complete",
                "result": {"representations": [
                    format!("{}/representations/5", server.uri())
                ]}
            }),
        )
        .await;

        Mock::given(method("GET"))
            .and(path("/representations/5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "file_name": "results.csv",
                "content_type": "application/csv"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/representations/5/media"))
            .respond_with(ResponseTemplate::new(200).set_body_string("a,b\n"))
            .expect(1)
            .mount(&server)
            .await;

        let output = TempDir::new().unwrap();
        let local = api
            .download_results(&format!("{}/jobs/42", server.uri()), "application/csv", output.path())
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(local).unwrap(), "a,b\n");
    }

    #[tokio::test]
    async fn test_download_input_media_with_job_id() {
        let (server, api) = setup().await;
        mount_job(&server, completed_job(&server.uri())).await;

        Mock::given(method("GET"))
            .and(path("/media/input"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"video".to_vec()))
            .mount(&server)
            .await;

        let output = TempDir::new().unwrap();
        let naming = InputNaming {
            filename: None,
            add_job_id: true,
        };
        let local = api
            .download_input_media(
                &format!("{}/jobs/42", server.uri()),
                "video/mp4",
                output.path(),
                &naming,
            )
            .await
            .unwrap();

        assert_eq!(local, output.path().join("EAAS_clip_42.mp4"));
        assert_eq!(std::fs::read(&local).unwrap(), b"video");
    }

    #[tokio::test]
    async fn test_session_metrics_parsed() {
        let (server, api) = setup().await;
        mount_job(&server, completed_job(&server.uri())).await;

        let metrics = json!([{"timestamp": 0.0, "joy": 12.5}]);
        Mock::given(method("GET"))
            .and(path("/media/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(metrics.clone()))
            .expect(1)
            .mount(&server)
            .await;

        let parsed = api
            .session_metrics(&format!("{}/jobs/42", server.uri()))
            .await
            .unwrap();
        assert_eq!(parsed, metrics);

        let requests = server.received_requests().await.unwrap();
        let media_request = requests
            .iter()
            .find(|r| r.url.path() == "/media/session")
            .expect("session media requested");
        let accept = media_request
            .headers
            .get("accept")
            .and_then(|v| v.to_str().ok());
        assert_ne!(accept, Some("application/json"));
    }

    #[tokio::test]
    async fn test_session_metrics_empty_body_is_empty_array() {
        let (server, api) = setup().await;
        mount_job(&server, completed_job(&server.uri())).await;

        Mock::given(method("GET"))
            .and(path("/media/session"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let parsed = api
            .session_metrics(&format!("{}/jobs/42", server.uri()))
            .await
            .unwrap();
        assert_eq!(parsed, json!([]));
    }

    #[tokio::test]
    async fn test_session_metrics_absent_is_empty() {
        let (server, api) = setup().await;
        mount_job(
            &server,
            json!({
                "self": format!("{}/jobs/42", server.uri()),
                "status": "complete",
                "result": {"representations": [
                    {"file_name": "results.csv", "content_type": "application/csv", "media": "unused"}
                ]}
            }),
        )
        .await;

        let parsed = api
            .session_metrics(&format!("{}/jobs/42", server.uri()))
            .await
            .unwrap();
        assert_eq!(parsed, json!([]));
    }
}

mod entry_tests {
    use super::*;
    use eaas::Fetchable;

    fn entry_body(uri: &str, representations: Value) -> Value {
        json!({
            "self": format!("{}/entries/7", uri),
            "annotations": format!("{}/entries/7/annotations", uri),
            "representation_self": format!("{}/entries/7/representations", uri),
            "representations": representations
        })
    }

    async fn mount_entry(server: &MockServer, representations: Value) {
        Mock::given(method("GET"))
            .and(path("/entries/7"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(entry_body(&server.uri(), representations)),
            )
            .mount(server)
            .await;
    }

    fn annotation_body(uri: &str, id: u32, key: &str, value: &str) -> Value {
        json!({
            "self": format!("{}/annotations/{}", uri, id),
            "source": "s",
            "key": key,
            "value": value
        })
    }

    #[tokio::test]
    async fn test_create_entry_applies_annotations_in_order() {
        let (server, api) = setup().await;
        let dir = TempDir::new().unwrap();
        let media = write_media(&dir, "face.jpg", b"jpeg bytes");

        Mock::given(method("POST"))
            .and(path("/entries"))
            .and(body_string_contains(r#"name="entry[media]"; filename="face.jpg""#))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(entry_body(&server.uri(), json!([]))),
            )
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/entries/7/annotations"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(annotation_body(&server.uri(), 1, "k", "v")),
            )
            .expect(2)
            .mount(&server)
            .await;

        let request = NewEntry::builder()
            .media_path(media)
            .annotations(vec![
                AnnotationData::new("s", "k1", "v1"),
                AnnotationData::new("s", "k2", "v2"),
            ])
            .build();
        api.create_entry(&request).await.unwrap();

        let posted: Vec<Value> = server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.method.as_str() == "POST" && r.url.path() == "/entries/7/annotations")
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect();

        assert_eq!(
            posted,
            vec![
                json!({"annotation": {"source": "s", "key": "k1", "value": "v1"}}),
                json!({"annotation": {"source": "s", "key": "k2", "value": "v2"}}),
            ]
        );
    }

    #[tokio::test]
    async fn test_add_annotations_then_list() {
        let (server, api) = setup().await;
        mount_entry(&server, json!([])).await;

        Mock::given(method("POST"))
            .and(path("/entries/7/annotations"))
            .and(header("content-type", "application/json"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(annotation_body(&server.uri(), 1, "k1", "v1")),
            )
            .expect(2)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/entries/7/annotations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                annotation_body(&server.uri(), 1, "k1", "v1"),
                annotation_body(&server.uri(), 2, "k2", "v2"),
            ])))
            .mount(&server)
            .await;

        let entry = api
            .entry(&format!("{}/entries/7", server.uri()))
            .await
            .unwrap();
        entry
            .add_annotations(&[
                AnnotationData::new("s", "k1", "v1"),
                AnnotationData::new("s", "k2", "v2"),
            ])
            .await
            .unwrap();

        let listed: Vec<(String, String, String)> = entry
            .annotations()
            .await
            .unwrap()
            .into_iter()
            .map(Into::into)
            .collect();
        assert_eq!(
            listed,
            vec![
                ("s".into(), "k1".into(), "v1".into()),
                ("s".into(), "k2".into(), "v2".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_add_annotations_stops_at_first_failure() {
        let (server, api) = setup().await;
        mount_entry(&server, json!([])).await;

        Mock::given(method("POST"))
            .and(path("/entries/7/annotations"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let entry = api
            .entry(&format!("{}/entries/7", server.uri()))
            .await
            .unwrap();
        let err = entry
            .add_annotations(&[
                AnnotationData::new("s", "k1", "v1"),
                AnnotationData::new("s", "k2", "v2"),
            ])
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn test_delete_annotation_without_match_is_noop() {
        let (server, api) = setup().await;
        mount_entry(&server, json!([])).await;

        Mock::given(method("GET"))
            .and(path("/entries/7/annotations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                annotation_body(&server.uri(), 1, "k1", "v1"),
            ])))
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(204))
            .expect(0)
            .mount(&server)
            .await;

        let entry = api
            .entry(&format!("{}/entries/7", server.uri()))
            .await
            .unwrap();
        entry.delete_annotation("s", "missing").await.unwrap();
        entry.delete_annotation("other", "k1").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_annotation_uses_own_url() {
        let (server, api) = setup().await;
        mount_entry(&server, json!([])).await;

        Mock::given(method("GET"))
            .and(path("/entries/7/annotations"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                annotation_body(&server.uri(), 1, "k1", "v1"),
                annotation_body(&server.uri(), 2, "k2", "v2"),
            ])))
            .mount(&server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/annotations/2"))
            .and(header("authorization", BASIC_AUTH))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let entry = api
            .entry(&format!("{}/entries/7", server.uri()))
            .await
            .unwrap();
        entry.delete_annotation("s", "k2").await.unwrap();
    }

    #[tokio::test]
    async fn test_representations_refetch_entry() {
        let (server, api) = setup().await;

        Mock::given(method("GET"))
            .and(path("/entries/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(entry_body(
                &server.uri(),
                json!([
                    {"self": format!("{}/representations/1", server.uri()),
                     "file_name": "clip.mp4", "file_size": 5, "content_type": "video/mp4"},
                    format!("{}/representations/2", server.uri())
                ]),
            )))
            .expect(2)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/representations/2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "file_name": "clip_small.mp4",
                "content_type": "application/vnd.affectiva.example+mp4"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut entry = eaas::Entry::fetch(api.transport(), &format!("{}/entries/7", server.uri()))
            .await
            .unwrap();
        let representations = entry.representations().await.unwrap();

        assert_eq!(representations.len(), 2);
        assert_eq!(representations[0].file_name(), "clip.mp4");
        assert_eq!(representations[0].file_size(), Some(5));
        assert_eq!(
            representations[1].content_type(),
            "application/vnd.affectiva.example+mp4"
        );
        assert_eq!(
            representations[1].url(),
            Some(format!("{}/representations/2", server.uri()).as_str())
        );
    }

    #[tokio::test]
    async fn test_add_representation_round_trip() {
        let (server, api) = setup().await;
        mount_entry(&server, json!([])).await;

        let dir = TempDir::new().unwrap();
        let contents: Vec<u8> = b"0123456789abcdef"
            .iter()
            .copied()
            .cycle()
            .take(64 * 1024)
            .collect();
        let media = write_media(&dir, "clip_small.mp4", &contents);

        Mock::given(method("POST"))
            .and(path("/entries/7/representations"))
            .and(body_string_contains(r#"name="media"; filename="clip_small.mp4""#))
            .and(body_string_contains("application/vnd.affectiva.example+mp4"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "self": format!("{}/representations/9", server.uri()),
                "file_name": "clip_small.mp4",
                "file_size": contents.len(),
                "content_type": "application/vnd.affectiva.example+mp4"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let entry = api
            .entry(&format!("{}/entries/7", server.uri()))
            .await
            .unwrap();
        let representation = entry
            .add_representation(&media, "application/vnd.affectiva.example+mp4")
            .await
            .unwrap();

        let uploaded = server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .find(|r| r.method.as_str() == "POST" && r.url.path() == "/entries/7/representations")
            .expect("upload request recorded");
        assert!(
            uploaded
                .body
                .windows(contents.len())
                .any(|window| window == contents.as_slice())
        );

        Mock::given(method("GET"))
            .and(path("/representations/9/media"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(contents.clone()))
            .mount(&server)
            .await;

        let destination = dir.path().join("downloaded.mp4");
        let written = representation.save_media(&destination).await.unwrap();

        assert_eq!(written, contents.len() as u64);
        assert_eq!(std::fs::read(&destination).unwrap(), contents);
    }

    #[tokio::test]
    async fn test_duplicate_representation_is_request_error() {
        let (server, api) = setup().await;
        mount_entry(&server, json!([])).await;

        let dir = TempDir::new().unwrap();
        let media = write_media(&dir, "clip.mp4", b"dup");

        Mock::given(method("POST"))
            .and(path("/entries/7/representations"))
            .respond_with(
                ResponseTemplate::new(422).set_body_string(r#"{"file_name":["has already been taken"]}"#),
            )
            .mount(&server)
            .await;

        let entry = api
            .entry(&format!("{}/entries/7", server.uri()))
            .await
            .unwrap();
        let err = entry
            .add_representation(&media, "video/mp4")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(422));
    }

    #[tokio::test]
    async fn test_update_representation_puts_media() {
        let (server, api) = setup().await;
        mount_entry(
            &server,
            json!([{
                "self": format!("{}/representations/1", server.uri()),
                "file_name": "clip.mp4",
                "content_type": "video/mp4"
            }]),
        )
        .await;

        let dir = TempDir::new().unwrap();
        let media = write_media(&dir, "clip.mp4", b"new rendition");

        Mock::given(method("PUT"))
            .and(path("/representations/1"))
            .and(body_string_contains("new rendition"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let mut entry = api
            .entry(&format!("{}/entries/7", server.uri()))
            .await
            .unwrap();
        let representations = entry.representations().await.unwrap();
        entry
            .update_representation(&representations[0], &media, "video/mp4")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_entry_without_entries_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "v1": {"jobs": format!("{}/jobs", server.uri())}
            })))
            .mount(&server)
            .await;

        let api = EmotionApi::from_config(&test_config(&server)).await.unwrap();
        let request = NewEntry::builder().media_path("face.jpg").build();
        let err = api.create_entry(&request).await.unwrap_err();
        assert!(matches!(err, Error::ServiceDiscovery(_)), "got {:?}", err);
    }
}
