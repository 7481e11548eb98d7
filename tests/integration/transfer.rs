use crate::*;

use torr_core::message::{
    ChunkRequest, DownloadRequest, FileInfo, SubnetRequest, UploadRequest,
};
use torr_services::TransportError;

async fn upload(overlay: &Overlay, i: usize, filename: &str, data: &[u8]) -> FileInfo {
    let reply = overlay
        .ask(
            i,
            Message::UploadRequest(UploadRequest {
                filename: filename.into(),
                data: data.to_vec(),
            }),
        )
        .await
        .unwrap();
    match reply {
        Message::UploadResponse(resp) => {
            assert_eq!(resp.status, Status::Success, "{}", resp.error_message);
            resp.file_info.unwrap()
        }
        other => panic!("unexpected reply: {other:?}"),
    }
}

/// Upload over TCP, then fetch the whole file and each chunk back.
#[tokio::test]
async fn test_upload_download_over_tcp() {
    let overlay = Overlay::start(1).await.unwrap();
    let data = payload(5000, 7);
    let info = upload(&overlay, 0, "big.bin", &data).await;
    assert_eq!(info.size, 5000);
    assert_eq!(info.chunks.len(), 5);

    match overlay
        .ask(0, Message::DownloadRequest(DownloadRequest { file_hash: info.hash.clone() }))
        .await
        .unwrap()
    {
        Message::DownloadResponse(resp) => assert_eq!(resp.data, data),
        other => panic!("unexpected reply: {other:?}"),
    }

    for chunk in &info.chunks {
        let reply = overlay
            .ask(
                0,
                Message::ChunkRequest(ChunkRequest {
                    file_hash: info.hash.clone(),
                    chunk_index: i64::from(chunk.index),
                }),
            )
            .await
            .unwrap();
        let Message::ChunkResponse(resp) = reply else {
            panic!("wrong reply type for chunk {}", chunk.index);
        };
        let start = chunk.index as usize * 1024;
        assert_eq!(resp.data, &data[start..start + chunk.size as usize]);
    }
}

#[tokio::test]
async fn test_duplicate_upload_keeps_first_name() {
    let overlay = Overlay::start(1).await.unwrap();
    let first = upload(&overlay, 0, "first.txt", b"same bytes").await;
    let second = upload(&overlay, 0, "second.txt", b"same bytes").await;
    assert_eq!(first, second);
    assert_eq!(second.filename, "first.txt");
    assert_eq!(overlay.nodes[0].context.store.len(), 1);
}

#[tokio::test]
async fn test_chunk_errors_over_tcp() {
    let overlay = Overlay::start(1).await.unwrap();
    let info = upload(&overlay, 0, "small.txt", b"tiny").await;

    let cases = [
        (vec![0u8; 15], 0, Status::MalformedRequest, "The file hash is not 16 bytes long."),
        (info.hash.clone(), -1, Status::MalformedRequest, "The chunk index is less than zero."),
        (vec![0u8; 16], 0, Status::NotFound, "File not found."),
        (info.hash.clone(), 1, Status::NotFound, "Chunk not found."),
    ];
    for (file_hash, chunk_index, status, message) in cases {
        let reply = overlay
            .ask(0, Message::ChunkRequest(ChunkRequest { file_hash, chunk_index }))
            .await
            .unwrap();
        let Message::ChunkResponse(resp) = reply else {
            panic!("wrong reply type");
        };
        assert_eq!(resp.status, status, "index {chunk_index}");
        assert_eq!(resp.error_message, message);
    }
}

/// Requests a node has no handler for are answered with "no message".
#[tokio::test]
async fn test_hub_request_to_node_gets_no_message() {
    let overlay = Overlay::start(1).await.unwrap();
    let err = client()
        .exchange(
            Message::SubnetRequest(SubnetRequest { subnet_id: 1 }),
            "127.0.0.1",
            overlay.nodes[0].addr.port(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::NoMessage), "got {err}");
}
