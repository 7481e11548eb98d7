//! Upload, download and single-chunk commands.

use anyhow::{Context, Result};
use torr_core::message::{ChunkRequest, DownloadRequest, FileInfo, UploadRequest};
use torr_core::Message;

use super::client::{check, parse_hash, unexpected, Target};

pub fn print_file(info: &FileInfo) {
    println!("  ┌─ {}", info.filename);
    println!("  │  hash   : {}", hex::encode(&info.hash));
    println!("  │  size   : {} bytes", info.size);
    println!("  └─ chunks : {}", info.chunks.len());
}

pub async fn cmd_upload(target: &Target, path: &str) -> Result<()> {
    let data = std::fs::read(path).with_context(|| format!("failed to read file: {}", path))?;
    let filename = std::path::Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("file")
        .to_string();

    let reply = target
        .send(Message::UploadRequest(UploadRequest { filename, data }))
        .await?;
    let resp = match reply {
        Message::UploadResponse(resp) => resp,
        other => return Err(unexpected(&other)),
    };
    check(resp.status, &resp.error_message)?;

    println!("Uploaded:");
    if let Some(info) = &resp.file_info {
        print_file(info);
    }
    Ok(())
}

pub async fn cmd_download(target: &Target, hash: &str, out: Option<&str>) -> Result<()> {
    let file_hash = parse_hash(hash)?;
    let reply = target
        .send(Message::DownloadRequest(DownloadRequest { file_hash }))
        .await?;
    let resp = match reply {
        Message::DownloadResponse(resp) => resp,
        other => return Err(unexpected(&other)),
    };
    check(resp.status, &resp.error_message)?;

    let path = out.map(str::to_string).unwrap_or_else(|| hash.to_string());
    std::fs::write(&path, &resp.data).with_context(|| format!("failed to write {}", path))?;
    println!("Wrote {} bytes to {}", resp.data.len(), path);
    Ok(())
}

pub async fn cmd_chunk(target: &Target, hash: &str, index: &str) -> Result<()> {
    let file_hash = parse_hash(hash)?;
    let chunk_index: i64 = index.parse().context("chunk index must be a number")?;
    let reply = target
        .send(Message::ChunkRequest(ChunkRequest {
            file_hash,
            chunk_index,
        }))
        .await?;
    let resp = match reply {
        Message::ChunkResponse(resp) => resp,
        other => return Err(unexpected(&other)),
    };
    check(resp.status, &resp.error_message)?;

    println!("Chunk {} ({} bytes): {}", chunk_index, resp.data.len(), hex::encode(&resp.data));
    Ok(())
}
