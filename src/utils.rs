#![allow(dead_code)]

use anyhow::{bail, Context, Result};
use prost::Message;
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Identity};

use crate::config::Config;

/// Derive this replica's controller identity from its pod ID.
///
/// The value doubles as the controller entity ID in topology, so every
/// replica must derive it the same way.
pub fn controller_id(pod_id: &str) -> String {
    format!("p4rt:{}", pod_id)
}

/// Encode the given model into a bytes vec.
pub fn encode_model<M: Message>(model: &M) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(model.encoded_len());
    model.encode(&mut buf).context("error serializing data model")?;
    Ok(buf)
}

/// Decode an object from the given buffer.
pub fn decode_model<M: Message + Default>(data: &[u8]) -> Result<M> {
    M::decode(data).context("error decoding object from storage")
}

/// Encode the given u64 as an array of big-endian bytes.
pub fn encode_u64(val: u64) -> [u8; 8] {
    val.to_be_bytes()
}

/// Decode the given bytes as a u64.
pub fn decode_u64(val: &[u8]) -> Result<u64> {
    match val {
        [b0, b1, b2, b3, b4, b5, b6, b7] => Ok(u64::from_be_bytes([*b0, *b1, *b2, *b3, *b4, *b5, *b6, *b7])),
        _ => bail!("invalid byte array given to decode as u64, invalid len {} needed 8", val.len()),
    }
}

/// Build a gRPC channel to the given `host:port` address, applying the
/// client TLS material from config when present.
pub async fn grpc_channel(address: &str, config: &Config) -> Result<Channel> {
    let mut endpoint = Channel::from_shared(format!("http://{}", address)).context("error building gRPC endpoint")?;
    if let (Some(ca_path), Some(cert_path), Some(key_path)) = (&config.ca_path, &config.cert_path, &config.key_path) {
        let ca = tokio::fs::read(ca_path).await.context("error reading CA certificate")?;
        let cert = tokio::fs::read(cert_path).await.context("error reading client certificate")?;
        let key = tokio::fs::read(key_path).await.context("error reading client key")?;
        let tls = ClientTlsConfig::new()
            .ca_certificate(Certificate::from_pem(ca))
            .identity(Identity::from_pem(cert, key));
        endpoint = endpoint.tls_config(tls).context("error applying TLS config")?;
    }
    let channel = endpoint.connect().await.context("error connecting gRPC channel")?;
    Ok(channel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn controller_id_uses_p4rt_scheme() {
        let id = controller_id("pod-b1946ac9");
        assert!(id == "p4rt:pod-b1946ac9", "unexpected controller ID {}", id);
    }

    #[test]
    fn u64_roundtrip() -> Result<()> {
        let encoded = encode_u64(1 << 40);
        let decoded = decode_u64(&encoded)?;
        assert!(decoded == 1 << 40, "expected {} got {}", 1u64 << 40, decoded);
        Ok(())
    }
}
