//! Post-resolution schema validation.
//!
//! Rebuilds a set of raw descriptors with prost-reflect to check that the
//! resolved mirrors still describe a linkable schema.

use crate::error::{Error, Result};
use bytes::BytesMut;
use prost::Message;
use prost_reflect::DescriptorPool;
use prost_types::{FileDescriptorProto, FileDescriptorSet};
use tracing::debug;

/// Builds a descriptor pool from `files`, failing if any reference dangles
pub fn validate(files: &[FileDescriptorProto]) -> Result<DescriptorPool> {
    let fds = FileDescriptorSet {
        file: files.to_vec(),
    };

    let mut buf = BytesMut::with_capacity(fds.encoded_len());
    fds.encode(&mut buf).map_err(|e| {
        Error::descriptor_build(format!("failed to encode descriptor set: {}", e))
    })?;

    let pool = DescriptorPool::decode(buf.freeze()).map_err(|e| {
        Error::descriptor_build(format!("failed to decode descriptor pool: {}", e))
    })?;

    debug!("Validated {} file(s)", files.len());
    Ok(pool)
}
