use std::io::Write;

use aws_sdk_s3::primitives::ByteStream;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tracing::info;

/// Serializes a value to JSON and uploads it to an S3 bucket with `application/json` content type.
///
/// With `gzip` set the body is compressed and uploaded under `<key>.gz` with
/// `Content-Encoding: gzip`.
pub async fn write_json_to_s3(
    client: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    value: &impl Serialize,
    gzip: bool,
) -> anyhow::Result<()> {
    let json = serde_json::to_vec(value)?;

    let (body, key, encoding) = if gzip {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        (encoder.finish()?, format!("{key}.gz"), Some("gzip"))
    } else {
        (json, key.to_string(), None)
    };

    let bytes = body.len();
    client
        .put_object()
        .bucket(bucket)
        .key(&key)
        .body(ByteStream::from(body))
        .content_type("application/json")
        .set_content_encoding(encoding.map(str::to_string))
        .send()
        .await?;

    info!(bucket, key = %key, bytes, "Uploaded JSON to S3");
    Ok(())
}
