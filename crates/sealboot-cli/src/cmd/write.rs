use std::io::Read;

use sealboot_core::codec;
use sealboot_core::config::SealbootConfig;
use sealboot_core::error::SealbootError;
use sealboot_core::tags::MachineIdentity;
use sealboot_core::writer::ChunkWriter;

pub(crate) struct WriteArgs<'a> {
    pub cluster: &'a str,
    pub machine: &'a str,
    pub role: &'a str,
    pub prefix: Option<&'a str>,
    pub tags: &'a [(String, String)],
    pub file: &'a str,
}

pub(crate) fn run_write(
    config: &SealbootConfig,
    args: WriteArgs<'_>,
) -> Result<(), Box<dyn std::error::Error>> {
    let document = read_document(args.file)?;
    let compressed = codec::gzip(&document)?;

    let mut identity = MachineIdentity::new(args.cluster, args.machine, args.role);
    identity.additional.extend(args.tags.iter().cloned());

    let store = sealboot_store::store_from_config(&config.store)?;
    let writer = ChunkWriter::new(&store, &config.writer, &config.retry);

    let receipt = writer
        .write(&identity, &compressed, args.prefix)
        .inspect_err(|e| {
            if let SealbootError::PartialWrite {
                prefix, committed, ..
            } = e
            {
                eprintln!("prefix: {prefix}");
                eprintln!("committed: {committed}");
            }
        })?;

    println!("prefix: {}", receipt.prefix);
    println!("count: {}", receipt.committed);
    Ok(())
}

fn read_document(file: &str) -> std::io::Result<Vec<u8>> {
    if file == "-" {
        let mut buf = Vec::new();
        std::io::stdin().read_to_end(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read(file)
}
