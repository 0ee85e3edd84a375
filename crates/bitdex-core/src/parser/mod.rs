//! Transaction and block parsing for one chain.
//!
//! [`Parser`] binds the shared wire decoder to a chain's parameters and
//! policy: it decodes raw transactions and blocks, builds transactions from
//! node JSON, fills output addresses through the chain's
//! [`ScriptClassifier`] and packs transactions for storage.

mod block;
pub(crate) mod json;
mod tx;
mod wire;

use bitcoin::hex::FromHex;
use serde_json::Value;
use tracing::warn;

use crate::address::{AddressCodec, AddressFormat};
use crate::chain::{self, ChainParams, ChainPolicy, Coin, PackPolicy, ScriptFlavour};
use crate::error::{CoreError, ParseError};
use crate::pack;
use crate::script::ScriptClassifier;
use crate::types::{AddressDescriptor, Block, Tx};

pub use tx::pegin_address;

/// Placeholder descriptor of a zerocoin input without a script.
const ZEROCOIN_UNKNOWN_INPUT: [u8; 10] = [0; 10];

#[derive(Debug, Clone)]
pub struct Parser {
    params: &'static ChainParams,
    policy: &'static ChainPolicy,
    classifier: ScriptClassifier,
}

impl Parser {
    pub fn new(params: &'static ChainParams) -> Self {
        let policy = params.policy();
        Self {
            params,
            policy,
            classifier: ScriptClassifier::new(AddressCodec::new(params), policy),
        }
    }

    /// Register the coin's networks and build a parser for `tag`.
    pub fn for_coin(coin: Coin, tag: &str) -> Result<Self, CoreError> {
        chain::lookup(coin, tag).map(Self::new)
    }

    /// Render addresses in `format` where the chain supports more than one.
    pub fn with_address_format(mut self, format: AddressFormat) -> Self {
        let codec = AddressCodec::new(self.params).with_format(format);
        self.classifier = ScriptClassifier::new(codec, self.policy);
        self
    }

    pub fn params(&self) -> &'static ChainParams {
        self.params
    }

    pub fn policy(&self) -> &'static ChainPolicy {
        self.policy
    }

    pub fn classifier(&self) -> &ScriptClassifier {
        &self.classifier
    }

    pub fn codec(&self) -> &AddressCodec {
        self.classifier.codec()
    }

    // ==========================================================================
    // Transactions
    // ==========================================================================

    /// Decode one serialised transaction and fill its output addresses.
    /// The buffer must hold exactly one transaction.
    pub fn parse_tx(&self, raw: &[u8]) -> Result<Tx, ParseError> {
        let mut r = wire::WireReader::new(raw);
        let mut tx = tx::decode_tx(&mut r, self.policy)?;
        if !r.is_empty() {
            return Err(ParseError::TrailingBytes {
                offset: r.position(),
                remaining: r.remaining(),
            });
        }
        self.fill_output_addresses(&mut tx);
        Ok(tx)
    }

    pub fn parse_tx_hex(&self, hex: &str) -> Result<Tx, ParseError> {
        let raw = Vec::<u8>::from_hex(hex).map_err(|e| ParseError::InvalidHex(e.to_string()))?;
        self.parse_tx(&raw)
    }

    /// Build a transaction from verbose `getrawtransaction` output. Amounts
    /// are read in the chain's display unit; addresses come from the
    /// script hex, not from the node.
    pub fn parse_tx_from_json(&self, raw: &Value) -> Result<Tx, ParseError> {
        let mut tx = json::tx_from_json(
            raw,
            self.policy.amount_decimals,
            self.policy.supports_vsize,
        )?;
        self.fill_output_addresses(&mut tx);
        Ok(tx)
    }

    pub fn fill_output_addresses(&self, tx: &mut Tx) {
        for output in &mut tx.outputs {
            output.addresses = self
                .classifier
                .script_to_addresses(&output.script_pubkey)
                .addresses;
        }
    }

    /// Descriptor for an input whose previous output is not indexed.
    ///
    /// Zerocoin spends have no prevout to resolve; they are keyed by their
    /// scriptSig, or by a zeroed placeholder when it is empty.
    pub fn addr_desc_for_unknown_input(&self, tx: &Tx, input: usize) -> Option<AddressDescriptor> {
        if self.policy.script == ScriptFlavour::Zerocoin {
            let script = tx
                .inputs
                .get(input)
                .map(|i| i.script_sig.as_bytes())
                .filter(|s| !s.is_empty())
                .unwrap_or(&ZEROCOIN_UNKNOWN_INPUT);
            return Some(AddressDescriptor::from_bytes(script.to_vec()));
        }
        let prevout = tx.inputs.get(input).and_then(|i| i.prevout);
        warn!(
            tx.txid = %tx.txid,
            tx.input = input,
            prevout = ?prevout,
            "input refers to an unknown output"
        );
        None
    }

    // ==========================================================================
    // Blocks
    // ==========================================================================

    /// Decode a serialised block. Transactions carry no addresses; the
    /// indexer resolves them.
    pub fn parse_block(&self, raw: &[u8]) -> Result<Block, ParseError> {
        block::decode_block(raw, self.policy)
    }

    // ==========================================================================
    // Packing
    // ==========================================================================

    /// Storage form of a confirmed (or, with height 0, mempool) transaction.
    pub fn pack_tx(&self, tx: &Tx, height: u32, block_time: i64) -> Result<Vec<u8>, ParseError> {
        match self.policy.pack {
            PackPolicy::RawWire => pack::pack_raw(tx, height, block_time),
            PackPolicy::Envelope => pack::envelope::pack(tx, height, block_time),
        }
    }

    /// Inverse of [`Parser::pack_tx`], returning the transaction and its height.
    pub fn unpack_tx(&self, buf: &[u8]) -> Result<(Tx, u32), ParseError> {
        match self.policy.pack {
            PackPolicy::RawWire => {
                let (height, block_time, raw) = pack::split_raw(buf)?;
                let mut tx = self.parse_tx(raw)?;
                tx.block_time = Some(block_time);
                Ok((tx, height))
            }
            PackPolicy::Envelope => pack::envelope::unpack(buf),
        }
    }
}
