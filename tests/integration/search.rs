use crate::*;

use torr_core::message::{SearchRequest, SearchResponse, UploadRequest};

async fn upload(overlay: &Overlay, i: usize, filename: &str) {
    overlay
        .ask(
            i,
            Message::UploadRequest(UploadRequest {
                filename: filename.into(),
                data: filename.as_bytes().to_vec(),
            }),
        )
        .await
        .unwrap();
}

async fn search(overlay: &Overlay, i: usize, regex: &str) -> SearchResponse {
    match overlay
        .ask(
            i,
            Message::SearchRequest(SearchRequest {
                regex: regex.into(),
                subnet_id: 1,
            }),
        )
        .await
        .unwrap()
    {
        Message::SearchResponse(resp) => resp,
        other => panic!("unexpected reply: {other:?}"),
    }
}

fn names(files: &[torr_core::message::FileInfo]) -> Vec<String> {
    let mut names: Vec<_> = files.iter().map(|f| f.filename.clone()).collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_search_spans_the_subnet() {
    let overlay = Overlay::start(3).await.unwrap();
    upload(&overlay, 0, "report1.txt").await;
    upload(&overlay, 1, "report2.txt").await;
    upload(&overlay, 1, "notes.txt").await;
    upload(&overlay, 2, "report3.txt").await;

    let resp = search(&overlay, 1, "report.*").await;
    assert_eq!(resp.status, Status::Success);
    assert_eq!(resp.results.len(), 3);

    let indices: Vec<u32> = resp.results.iter().map(|r| r.node.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
    assert!(resp.results.iter().all(|r| r.status == Status::Success));
    assert_eq!(names(&resp.results[0].files), vec!["report1.txt"]);
    assert_eq!(names(&resp.results[1].files), vec!["report2.txt"]);
    assert_eq!(names(&resp.results[2].files), vec!["report3.txt"]);
}

#[tokio::test]
async fn test_unreachable_member_is_reported_in_order() {
    let mut overlay = Overlay::start(0).await.unwrap();
    overlay.add_node("alpha", 1).await.unwrap();
    let ghost = overlay.hub.add_ghost("bravo", 1).await.unwrap();
    overlay.add_node("charlie", 1).await.unwrap();
    upload(&overlay, 0, "report-a.txt").await;
    upload(&overlay, 1, "report-c.txt").await;

    let resp = search(&overlay, 0, "report.*").await;
    assert_eq!(resp.results.len(), 3);

    let owners: Vec<&str> = resp.results.iter().map(|r| r.node.owner.as_str()).collect();
    assert_eq!(owners, vec!["alpha", "bravo", "charlie"]);

    assert_eq!(resp.results[1].node, ghost);
    assert_eq!(resp.results[1].status, Status::NetworkError);
    assert_eq!(resp.results[1].error_message, "Cannot establish connection with node.");
    assert_eq!(names(&resp.results[0].files), vec!["report-a.txt"]);
    assert_eq!(names(&resp.results[2].files), vec!["report-c.txt"]);
}

#[tokio::test]
async fn test_search_with_bad_pattern() {
    let overlay = Overlay::start(2).await.unwrap();
    let resp = search(&overlay, 0, "*report").await;
    assert_eq!(resp.status, Status::MalformedRequest);
    assert_eq!(resp.error_message, "Invalid regex.");
    assert!(resp.results.is_empty());
}
