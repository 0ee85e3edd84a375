use super::tx::decode_tx;
use super::wire::WireReader;
use crate::chain::{BlockEnvelope, ChainPolicy};
use crate::error::ParseError;
use crate::types::{Block, BlockHeader};

const HEADER_SIZE: usize = 80;
const VERSION_AUXPOW: i32 = 1 << 8;

/// Smallest possible transaction: version, two empty counts, lock time.
const MIN_TX_PAYLOAD: usize = 10;
const MAX_BLOCK_PAYLOAD: u64 = 4_000_000;
pub(crate) const MAX_TX_PER_BLOCK: u64 = MAX_BLOCK_PAYLOAD / MIN_TX_PAYLOAD as u64 + 1;

/// Decode a serialised block. Hash, height and neighbours are left for
/// the caller to fill from node metadata.
pub(crate) fn decode_block(raw: &[u8], policy: &ChainPolicy) -> Result<Block, ParseError> {
    let mut r = WireReader::new(raw);
    let header: [u8; HEADER_SIZE] = r.read_array("block_header")?;
    let version = i32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    let time = u32::from_le_bytes([header[68], header[69], header[70], header[71]]);

    match policy.block {
        BlockEnvelope::Plain => {}
        BlockEnvelope::AuxPow => {
            if version & VERSION_AUXPOW != 0 {
                skip_auxpow(&mut r)?;
            }
        }
        BlockEnvelope::AccumulatorCheckpoint => {
            if version > 1 {
                r.skip(32, "accumulator_checkpoint")?;
            }
        }
        BlockEnvelope::SaplingCheckpoint => {
            if (4..=6).contains(&version) {
                r.skip(32, "accumulator_checkpoint")?;
            }
            if version > 7 {
                r.skip(32, "final_sapling_root")?;
            }
        }
    }

    let count_at = r.position();
    let (count, hint) = r.read_count("tx_count", MIN_TX_PAYLOAD)?;
    if count > MAX_TX_PER_BLOCK {
        return Err(ParseError::TooManyTransactions {
            offset: count_at,
            count,
        });
    }

    let mut txs = Vec::with_capacity(hint);
    for _ in 0..count {
        txs.push(decode_tx(&mut r, policy)?);
    }

    Ok(Block {
        header: BlockHeader {
            size: raw.len(),
            time: i64::from(time),
            ..BlockHeader::default()
        },
        txs,
    })
}

/// Skip the merged-mining proof that follows an auxpow header.
fn skip_auxpow(r: &mut WireReader<'_>) -> Result<(), ParseError> {
    let start = r.position();
    skip_auxpow_fields(r).map_err(|e| ParseError::BadAuxpow {
        offset: start,
        reason: e.to_string(),
    })
}

fn skip_auxpow_fields(r: &mut WireReader<'_>) -> Result<(), ParseError> {
    // Coinbase of the parent chain, always plain Bitcoin wire format.
    decode_tx(r, &ChainPolicy::BITCOIN)?;
    r.skip(32, "auxpow_parent_hash")?;
    let branch = r.read_varint("auxpow_merkle_branch")?;
    r.skip_records(branch, 32, "auxpow_merkle_branch")?;
    r.skip(4, "auxpow_index")?;
    let chain_branch = r.read_varint("auxpow_chain_merkle_branch")?;
    r.skip_records(chain_branch, 32, "auxpow_chain_merkle_branch")?;
    r.skip(4, "auxpow_chain_index")?;
    r.skip(HEADER_SIZE, "auxpow_parent_header")
}
