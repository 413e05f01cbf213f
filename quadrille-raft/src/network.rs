// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Raft-to-Raft RPC transport: a small length-prefixed `bincode` frame
//! protocol on top of `tokio::net::TcpStream`. Internal to consensus, and
//! never exposed to clients -- it speaks a different, non-line-oriented
//! wire format than the client-facing gateways named out of scope.

use crate::types::TypeConfig;
use openraft::error::{InstallSnapshotError, NetworkError, RPCError, RaftError, Unreachable};
use openraft::network::{RPCOption, RaftNetwork, RaftNetworkFactory};
use openraft::raft::{
    AppendEntriesRequest, AppendEntriesResponse, InstallSnapshotRequest, InstallSnapshotResponse, VoteRequest,
    VoteResponse,
};
use openraft::BasicNode;
use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Builds a fresh [`Connection`] for each target node. `openraft` calls
/// this whenever it needs to talk to a peer; callers do not keep the
/// factory's connections alive between RPCs.
#[derive(Clone, Default)]
pub struct NetworkFactory;

impl RaftNetworkFactory<TypeConfig> for NetworkFactory {
    type Network = Connection;

    async fn new_client(&mut self, _target: u64, node: &BasicNode) -> Self::Network {
        Connection { addr: node.addr.clone() }
    }
}

pub struct Connection {
    addr: String,
}

async fn send_frame<Req: Serialize, Resp: DeserializeOwned>(
    addr: &str,
    req: &Req,
) -> std::io::Result<Resp> {
    let mut stream = TcpStream::connect(addr).await?;
    let body = bincode::serialize(req).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    stream.write_u32(body.len() as u32).await?;
    stream.write_all(&body).await?;

    let len = stream.read_u32().await? as usize;
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await?;
    bincode::deserialize(&buf).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl RaftNetwork<TypeConfig> for Connection {
    async fn append_entries(
        &mut self,
        rpc: AppendEntriesRequest<TypeConfig>,
        _option: RPCOption,
    ) -> Result<AppendEntriesResponse<u64>, RPCError<u64, BasicNode, RaftError<u64>>> {
        send_frame(&self.addr, &rpc)
            .await
            .map_err(|e| RPCError::Unreachable(Unreachable::new(&NetworkError::new(&e))))
    }

    async fn install_snapshot(
        &mut self,
        rpc: InstallSnapshotRequest<TypeConfig>,
        _option: RPCOption,
    ) -> Result<InstallSnapshotResponse<u64>, RPCError<u64, BasicNode, RaftError<u64, InstallSnapshotError>>> {
        send_frame(&self.addr, &rpc)
            .await
            .map_err(|e| RPCError::Unreachable(Unreachable::new(&NetworkError::new(&e))))
    }

    async fn vote(
        &mut self,
        rpc: VoteRequest<u64>,
        _option: RPCOption,
    ) -> Result<VoteResponse<u64>, RPCError<u64, BasicNode, RaftError<u64>>> {
        send_frame(&self.addr, &rpc)
            .await
            .map_err(|e| RPCError::Unreachable(Unreachable::new(&NetworkError::new(&e))))
    }
}

/// Server side of the frame protocol: accepts connections on `bind_addr`
/// and dispatches each decoded RPC to the local `Raft` handle. Runs until
/// the process exits; callers spawn it as its own task.
pub async fn serve(bind_addr: &str, raft: crate::types::Raft) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    loop {
        let (mut stream, _peer) = listener.accept().await?;
        let raft = raft.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(&mut stream, &raft).await {
                log::warn!("raft transport connection ended: {}", e);
            }
        });
    }
}

async fn handle_connection(stream: &mut TcpStream, raft: &crate::types::Raft) -> std::io::Result<()> {
    let len = stream.read_u32().await? as usize;
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await?;

    // Each connection carries exactly one request; which RPC kind it is
    // gets resolved by trying each decode in turn, since the frame itself
    // is not tagged.
    if let Ok(req) = bincode::deserialize::<AppendEntriesRequest<TypeConfig>>(&buf) {
        let resp = raft.append_entries(req).await;
        return reply(stream, &resp).await;
    }
    if let Ok(req) = bincode::deserialize::<VoteRequest<u64>>(&buf) {
        let resp = raft.vote(req).await;
        return reply(stream, &resp).await;
    }
    if let Ok(req) = bincode::deserialize::<InstallSnapshotRequest<TypeConfig>>(&buf) {
        let resp = raft.install_snapshot(req).await;
        return reply(stream, &resp).await;
    }
    Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "unrecognized raft rpc frame"))
}

async fn reply<T: Serialize>(stream: &mut TcpStream, value: &T) -> std::io::Result<()> {
    let body = bincode::serialize(value).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    stream.write_u32(body.len() as u32).await?;
    stream.write_all(&body).await?;
    Ok(())
}
