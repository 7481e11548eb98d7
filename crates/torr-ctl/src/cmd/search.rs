//! Search and replication commands.

use anyhow::{Context, Result};
use torr_core::message::{FileInfo, LocalSearchRequest, ReplicateRequest, SearchRequest};
use torr_core::Message;

use super::client::{check, parse_hash, unexpected, Target};
use super::files::print_file;

fn parse_subnet(text: &str) -> Result<u32> {
    text.parse().context("subnet id must be a number")
}

pub async fn cmd_local_search(target: &Target, pattern: &str) -> Result<()> {
    let reply = target
        .send(Message::LocalSearchRequest(LocalSearchRequest {
            regex: pattern.to_string(),
        }))
        .await?;
    let resp = match reply {
        Message::LocalSearchResponse(resp) => resp,
        other => return Err(unexpected(&other)),
    };
    check(resp.status, &resp.error_message)?;

    if resp.file_info.is_empty() {
        println!("No matching files.");
    }
    for info in &resp.file_info {
        print_file(info);
    }
    Ok(())
}

pub async fn cmd_search(target: &Target, pattern: &str, subnet: &str) -> Result<()> {
    let subnet_id = parse_subnet(subnet)?;
    let reply = target
        .send(Message::SearchRequest(SearchRequest {
            regex: pattern.to_string(),
            subnet_id,
        }))
        .await?;
    let resp = match reply {
        Message::SearchResponse(resp) => resp,
        other => return Err(unexpected(&other)),
    };
    check(resp.status, &resp.error_message)?;

    println!("═══════════════════════════════════════");
    println!("  Search results ({} nodes)", resp.results.len());
    println!("═══════════════════════════════════════");
    for result in &resp.results {
        if result.status.is_success() {
            println!("{} : {} matches", result.node, result.files.len());
            for info in &result.files {
                print_file(info);
            }
        } else {
            println!("{} : {:?} {}", result.node, result.status, result.error_message);
        }
    }
    Ok(())
}

/// Find the descriptor for `hash` anywhere in the subnet.
async fn resolve(target: &Target, hash: &[u8], subnet_id: u32) -> Result<FileInfo> {
    let reply = target
        .send(Message::SearchRequest(SearchRequest {
            regex: ".*".to_string(),
            subnet_id,
        }))
        .await?;
    let resp = match reply {
        Message::SearchResponse(resp) => resp,
        other => return Err(unexpected(&other)),
    };
    check(resp.status, &resp.error_message)?;

    resp.results
        .into_iter()
        .flat_map(|r| r.files)
        .find(|f| f.hash == hash)
        .with_context(|| format!("no node in subnet {subnet_id} holds {}", hex::encode(hash)))
}

pub async fn cmd_replicate(target: &Target, hash: &str, subnet: &str) -> Result<()> {
    let subnet_id = parse_subnet(subnet)?;
    let file_info = resolve(target, &parse_hash(hash)?, subnet_id).await?;

    let reply = target
        .send(Message::ReplicateRequest(ReplicateRequest {
            file_info,
            subnet_id,
        }))
        .await?;
    let resp = match reply {
        Message::ReplicateResponse(resp) => resp,
        other => return Err(unexpected(&other)),
    };

    for attempt in &resp.node_status_list {
        println!(
            "  chunk {:>4} from {} : {:?} {}",
            attempt.chunk_index, attempt.node, attempt.status, attempt.error_message
        );
    }
    check(resp.status, &resp.error_message)?;
    println!("Replicated.");
    Ok(())
}
