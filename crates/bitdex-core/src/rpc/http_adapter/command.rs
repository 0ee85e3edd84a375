//! Node commands and their parameter encoding per [`RpcDialect`].

use serde_json::{json, Map, Value};

use super::super::RpcDialect;

/// A node method with its named parameters, in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Command<'a> {
    GetBestBlockHash,
    GetBlockCount,
    GetBlockchainInfo,
    GetNetworkInfo,
    GetRawMempool,
    GetBlockHash { height: u32 },
    GetBlockHeader { hash: &'a str },
    GetBlock { hash: &'a str, verbosity: u8 },
    GetRawTransaction { txid: &'a str, verbose: bool },
    EstimateSmartFee { conf_target: u32, conservative: bool },
    EstimateFee { blocks: u32 },
    SendRawTransaction { hex: &'a str },
    GetMempoolEntry { txid: &'a str },
}

impl Command<'_> {
    pub(super) fn method(&self) -> &'static str {
        match self {
            Self::GetBestBlockHash => "getbestblockhash",
            Self::GetBlockCount => "getblockcount",
            Self::GetBlockchainInfo => "getblockchaininfo",
            Self::GetNetworkInfo => "getnetworkinfo",
            Self::GetRawMempool => "getrawmempool",
            Self::GetBlockHash { .. } => "getblockhash",
            Self::GetBlockHeader { .. } => "getblockheader",
            Self::GetBlock { .. } => "getblock",
            Self::GetRawTransaction { .. } => "getrawtransaction",
            Self::EstimateSmartFee { .. } => "estimatesmartfee",
            Self::EstimateFee { .. } => "estimatefee",
            Self::SendRawTransaction { .. } => "sendrawtransaction",
            Self::GetMempoolEntry { .. } => "getmempoolentry",
        }
    }

    fn named_params(&self) -> Vec<(&'static str, Value)> {
        match *self {
            Self::GetBestBlockHash
            | Self::GetBlockCount
            | Self::GetBlockchainInfo
            | Self::GetNetworkInfo
            | Self::GetRawMempool => Vec::new(),
            Self::GetBlockHash { height } => vec![("height", json!(height))],
            Self::GetBlockHeader { hash } => {
                vec![("blockhash", json!(hash)), ("verbose", json!(true))]
            }
            Self::GetBlock { hash, verbosity } => {
                vec![("blockhash", json!(hash)), ("verbosity", json!(verbosity))]
            }
            Self::GetRawTransaction { txid, verbose } => {
                vec![("txid", json!(txid)), ("verbose", json!(verbose))]
            }
            Self::EstimateSmartFee {
                conf_target,
                conservative,
            } => vec![
                ("conf_target", json!(conf_target)),
                (
                    "estimate_mode",
                    json!(if conservative { "CONSERVATIVE" } else { "ECONOMICAL" }),
                ),
            ],
            Self::EstimateFee { blocks } => vec![("nblocks", json!(blocks))],
            Self::SendRawTransaction { hex } => vec![("hexstring", json!(hex))],
            Self::GetMempoolEntry { txid } => vec![("txid", json!(txid))],
        }
    }

    /// Commands sent positionally even to named-parameter nodes.
    fn always_positional(&self) -> bool {
        matches!(
            self,
            Self::SendRawTransaction { .. } | Self::GetMempoolEntry { .. }
        )
    }

    /// The `params` member of the request.
    pub(super) fn params(&self, dialect: RpcDialect) -> Value {
        match (dialect, self) {
            // Legacy nodes take a boolean verbose flag for getblock and an
            // integer one for getrawtransaction.
            (RpcDialect::V1, Self::GetBlock { hash, verbosity }) => json!([hash, *verbosity > 0]),
            (RpcDialect::V1, Self::GetRawTransaction { txid, verbose }) => {
                json!([txid, u8::from(*verbose)])
            }
            (RpcDialect::V1, _) => positional(self.named_params()),
            (RpcDialect::V2, cmd) if cmd.always_positional() => positional(cmd.named_params()),
            (RpcDialect::V2, cmd) => {
                let params = cmd.named_params();
                if params.is_empty() {
                    return Value::Array(Vec::new());
                }
                Value::Object(
                    params
                        .into_iter()
                        .map(|(name, value)| (name.to_owned(), value))
                        .collect::<Map<_, _>>(),
                )
            }
        }
    }
}

fn positional(params: Vec<(&'static str, Value)>) -> Value {
    Value::Array(params.into_iter().map(|(_, value)| value).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "00000000000000000003a1b2";

    #[test]
    fn v1_getblock_takes_boolean_verbosity() {
        let raw = Command::GetBlock {
            hash: HASH,
            verbosity: 0,
        };
        assert_eq!(raw.params(RpcDialect::V1), json!([HASH, false]));
        let full = Command::GetBlock {
            hash: HASH,
            verbosity: 2,
        };
        assert_eq!(full.params(RpcDialect::V1), json!([HASH, true]));
    }

    #[test]
    fn v1_getrawtransaction_takes_integer_verbosity() {
        let cmd = Command::GetRawTransaction {
            txid: "ab",
            verbose: true,
        };
        assert_eq!(cmd.params(RpcDialect::V1), json!(["ab", 1]));
    }

    #[test]
    fn v1_other_commands_are_positional_in_declaration_order() {
        let cmd = Command::EstimateSmartFee {
            conf_target: 6,
            conservative: false,
        };
        assert_eq!(cmd.params(RpcDialect::V1), json!([6, "ECONOMICAL"]));
        assert_eq!(Command::GetBlockCount.params(RpcDialect::V1), json!([]));
    }

    #[test]
    fn v2_uses_named_parameters() {
        let cmd = Command::GetBlock {
            hash: HASH,
            verbosity: 1,
        };
        assert_eq!(
            cmd.params(RpcDialect::V2),
            json!({"blockhash": HASH, "verbosity": 1})
        );
        let fee = Command::EstimateSmartFee {
            conf_target: 2,
            conservative: true,
        };
        assert_eq!(
            fee.params(RpcDialect::V2),
            json!({"conf_target": 2, "estimate_mode": "CONSERVATIVE"})
        );
        assert_eq!(
            Command::EstimateFee { blocks: 3 }.params(RpcDialect::V2),
            json!({"nblocks": 3})
        );
    }

    #[test]
    fn v2_keeps_send_and_mempool_entry_positional() {
        assert_eq!(
            Command::SendRawTransaction { hex: "0100" }.params(RpcDialect::V2),
            json!(["0100"])
        );
        assert_eq!(
            Command::GetMempoolEntry { txid: "ab" }.params(RpcDialect::V2),
            json!(["ab"])
        );
    }
}
