use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::policy::{BlockEnvelope, ChainPolicy, PackPolicy, ScriptFlavour, TxFormat, TxidHash};
use super::{ChainParams, ChainTag, ChecksumHasher};
use crate::rpc::RpcDialect;

/// Closed set of supported Bitcoin-family coins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coin {
    Bitcoin,
    Litecoin,
    Dogecoin,
    Namecoin,
    Groestlcoin,
    BitZeny,
    Monacoin,
    Vertcoin,
    Dash,
    BitcoinGold,
    ECash,
    Liquid,
    SnowGem,
    Pivx,
    Bytz,
    DigiByte,
    Viacoin,
    Myriad,
    Fujicoin,
    Flo,
    Koto,
    Zcash,
    DeepOnion,
    Feathercoin,
    GameCredits,
    Bellcoin,
    CpuChain,
    Bitcore,
    Polis,
    Verge,
    Vipstarcoin,
}

impl Coin {
    pub const ALL: [Coin; 31] = [
        Coin::Bitcoin,
        Coin::Litecoin,
        Coin::Dogecoin,
        Coin::Namecoin,
        Coin::Groestlcoin,
        Coin::BitZeny,
        Coin::Monacoin,
        Coin::Vertcoin,
        Coin::Dash,
        Coin::BitcoinGold,
        Coin::ECash,
        Coin::Liquid,
        Coin::SnowGem,
        Coin::Pivx,
        Coin::Bytz,
        Coin::DigiByte,
        Coin::Viacoin,
        Coin::Myriad,
        Coin::Fujicoin,
        Coin::Flo,
        Coin::Koto,
        Coin::Zcash,
        Coin::DeepOnion,
        Coin::Feathercoin,
        Coin::GameCredits,
        Coin::Bellcoin,
        Coin::CpuChain,
        Coin::Bitcore,
        Coin::Polis,
        Coin::Verge,
        Coin::Vipstarcoin,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Bitcoin => "bitcoin",
            Self::Litecoin => "litecoin",
            Self::Dogecoin => "dogecoin",
            Self::Namecoin => "namecoin",
            Self::Groestlcoin => "groestlcoin",
            Self::BitZeny => "bitzeny",
            Self::Monacoin => "monacoin",
            Self::Vertcoin => "vertcoin",
            Self::Dash => "dash",
            Self::BitcoinGold => "bitcoingold",
            Self::ECash => "ecash",
            Self::Liquid => "liquid",
            Self::SnowGem => "snowgem",
            Self::Pivx => "pivx",
            Self::Bytz => "bytz",
            Self::DigiByte => "digibyte",
            Self::Viacoin => "viacoin",
            Self::Myriad => "myriad",
            Self::Fujicoin => "fujicoin",
            Self::Flo => "flo",
            Self::Koto => "koto",
            Self::Zcash => "zcash",
            Self::DeepOnion => "deeponion",
            Self::Feathercoin => "feathercoin",
            Self::GameCredits => "gamecredits",
            Self::Bellcoin => "bellcoin",
            Self::CpuChain => "cpuchain",
            Self::Bitcore => "bitcore",
            Self::Polis => "polis",
            Self::Verge => "verge",
            Self::Vipstarcoin => "vipstarcoin",
        }
    }

    /// Networks registered when the coin is first looked up.
    pub fn registered_networks(self) -> &'static [&'static ChainParams] {
        match self {
            Self::Bitcoin => &[&BITCOIN_MAIN, &BITCOIN_TEST],
            Self::Litecoin => &[&LITECOIN_MAIN, &LITECOIN_TEST],
            Self::Dogecoin => &[&DOGECOIN_MAIN],
            Self::Namecoin => &[&NAMECOIN_MAIN],
            Self::Groestlcoin => &[&GROESTLCOIN_MAIN, &GROESTLCOIN_TEST],
            Self::BitZeny => &[&BITZENY_MAIN, &BITZENY_TEST],
            Self::Monacoin => &[&MONACOIN_MAIN, &MONACOIN_TEST],
            Self::Vertcoin => &[&VERTCOIN_MAIN, &VERTCOIN_TEST],
            Self::Dash => &[&DASH_MAIN, &DASH_TEST, &DASH_REGTEST],
            Self::BitcoinGold => &[&BITCOIN_GOLD_MAIN, &BITCOIN_GOLD_TEST],
            Self::ECash => &[&ECASH_MAIN, &ECASH_TEST, &ECASH_REGTEST],
            Self::Liquid => &[&LIQUID_MAIN],
            Self::SnowGem => &[&SNOWGEM_MAIN, &SNOWGEM_TEST],
            Self::Pivx => &[&PIVX_MAIN, &PIVX_TEST],
            Self::Bytz => &[&BYTZ_MAIN, &BYTZ_TEST],
            Self::DigiByte => &[&DIGIBYTE_MAIN, &DIGIBYTE_TEST],
            Self::Viacoin => &[&VIACOIN_MAIN, &VIACOIN_TEST],
            Self::Myriad => &[&MYRIAD_MAIN],
            Self::Fujicoin => &[&FUJICOIN_MAIN, &FUJICOIN_TEST],
            Self::Flo => &[&FLO_MAIN, &FLO_TEST],
            Self::Koto => &[&KOTO_MAIN, &KOTO_TEST, &KOTO_REGTEST],
            Self::Zcash => &[&ZCASH_MAIN, &ZCASH_TEST, &ZCASH_REGTEST],
            Self::DeepOnion => &[&DEEPONION_MAIN],
            Self::Feathercoin => &[&FEATHERCOIN_MAIN],
            Self::GameCredits => &[&GAMECREDITS_MAIN, &GAMECREDITS_TEST],
            Self::Bellcoin => &[&BELLCOIN_MAIN, &BELLCOIN_TEST],
            Self::CpuChain => &[&CPUCHAIN_MAIN, &CPUCHAIN_TEST],
            Self::Bitcore => &[&BITCORE_MAIN, &BITCORE_TEST],
            Self::Polis => &[&POLIS_MAIN, &POLIS_TEST, &POLIS_REGTEST],
            Self::Verge => &[&VERGE_MAIN],
            Self::Vipstarcoin => &[&VIPSTARCOIN_MAIN, &VIPSTARCOIN_TEST],
        }
    }

    /// Parameter record for `tag`, falling back to main when the coin has
    /// no such network. Does not touch the registry.
    pub fn params(self, tag: ChainTag) -> &'static ChainParams {
        let found: Option<&'static ChainParams> = match (self, tag) {
            (Self::Bitcoin, ChainTag::Regtest) => Some(&BITCOIN_REGTEST),
            (Self::Bitcoin, ChainTag::Signet) => Some(&BITCOIN_SIGNET),
            (Self::Litecoin, ChainTag::Regtest) => Some(&LITECOIN_REGTEST),
            (Self::Groestlcoin, ChainTag::Regtest) => Some(&GROESTLCOIN_REGTEST),
            (Self::Groestlcoin, ChainTag::Signet) => Some(&GROESTLCOIN_SIGNET),
            (Self::Vertcoin, ChainTag::Regtest) => Some(&VERTCOIN_REGTEST),
            (Self::BitcoinGold, ChainTag::Regtest) => Some(&BITCOIN_GOLD_REGTEST),
            (Self::SnowGem, ChainTag::Regtest) => Some(&SNOWGEM_REGTEST),
            (Self::Viacoin, ChainTag::Regtest) => Some(&VIACOIN_REGTEST),
            (Self::Flo, ChainTag::Regtest) => Some(&FLO_REGTEST),
            (Self::GameCredits, ChainTag::Regtest) => Some(&GAMECREDITS_REGTEST),
            (Self::Bitcore, ChainTag::Regtest) => Some(&BITCORE_REGTEST),
            (coin, tag) => coin
                .registered_networks()
                .iter()
                .copied()
                .find(|params| params.tag == tag),
        };
        found.unwrap_or(self.registered_networks()[0])
    }

    pub fn policy(self) -> &'static ChainPolicy {
        match self {
            Self::Bitcoin
            | Self::Litecoin
            | Self::BitZeny
            | Self::Monacoin
            | Self::Vertcoin
            | Self::BitcoinGold
            | Self::DigiByte
            | Self::Viacoin
            | Self::Fujicoin
            | Self::GameCredits
            | Self::Bellcoin
            | Self::CpuChain
            | Self::Vipstarcoin => &ChainPolicy::BITCOIN,
            Self::Myriad => &MYRIAD_POLICY,
            Self::Flo | Self::DeepOnion | Self::Feathercoin | Self::Bitcore => &ENVELOPE_POLICY,
            Self::Verge => &VERGE_POLICY,
            Self::Koto | Self::Zcash => &ZCASH_POLICY,
            Self::Polis => &DASH_POLICY,
            Self::Dogecoin => &DOGECOIN_POLICY,
            Self::Namecoin => &NAMECOIN_POLICY,
            Self::Groestlcoin => &GROESTLCOIN_POLICY,
            Self::Dash => &DASH_POLICY,
            Self::ECash => &ECASH_POLICY,
            Self::Liquid => &LIQUID_POLICY,
            Self::SnowGem => &SNOWGEM_POLICY,
            Self::Pivx => &PIVX_POLICY,
            Self::Bytz => &BYTZ_POLICY,
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Coin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let coin = match lower.as_str() {
            "bitcoin" | "btc" => Self::Bitcoin,
            "litecoin" | "ltc" => Self::Litecoin,
            "dogecoin" | "doge" => Self::Dogecoin,
            "namecoin" | "nmc" => Self::Namecoin,
            "groestlcoin" | "grs" => Self::Groestlcoin,
            "bitzeny" | "zny" => Self::BitZeny,
            "monacoin" | "mona" => Self::Monacoin,
            "vertcoin" | "vtc" => Self::Vertcoin,
            "dash" => Self::Dash,
            "bitcoingold" | "bitcoin gold" | "btg" => Self::BitcoinGold,
            "ecash" | "xec" => Self::ECash,
            "liquid" => Self::Liquid,
            "snowgem" | "xsg" => Self::SnowGem,
            "pivx" => Self::Pivx,
            "bytz" => Self::Bytz,
            "digibyte" | "dgb" => Self::DigiByte,
            "viacoin" | "via" => Self::Viacoin,
            "myriad" | "xmy" => Self::Myriad,
            "fujicoin" | "fjc" => Self::Fujicoin,
            "flo" => Self::Flo,
            "koto" => Self::Koto,
            "zcash" | "zec" => Self::Zcash,
            "deeponion" | "onion" => Self::DeepOnion,
            "feathercoin" | "ftc" => Self::Feathercoin,
            "gamecredits" | "game" => Self::GameCredits,
            "bellcoin" | "bell" => Self::Bellcoin,
            "cpuchain" | "cpu" => Self::CpuChain,
            "bitcore" | "btx" => Self::Bitcore,
            "polis" => Self::Polis,
            "verge" | "xvg" => Self::Verge,
            "vipstarcoin" | "vips" => Self::Vipstarcoin,
            _ => return Err(format!("unknown coin `{s}`")),
        };
        Ok(coin)
    }
}

// ==============================================================================
// Policies
// ==============================================================================

const DOGECOIN_POLICY: ChainPolicy = ChainPolicy {
    block: BlockEnvelope::AuxPow,
    ..ChainPolicy::LEGACY
};

const NAMECOIN_POLICY: ChainPolicy = ChainPolicy {
    block: BlockEnvelope::AuxPow,
    rpc_dialect: RpcDialect::V1,
    ..ChainPolicy::BITCOIN
};

const GROESTLCOIN_POLICY: ChainPolicy = ChainPolicy {
    txid_hash: TxidHash::Sha256,
    pack: PackPolicy::Envelope,
    rpc_dialect: RpcDialect::V1,
    ..ChainPolicy::BITCOIN
};

const DASH_POLICY: ChainPolicy = ChainPolicy {
    rpc_dialect: RpcDialect::V1,
    ..ChainPolicy::LEGACY
};

const ECASH_POLICY: ChainPolicy = ChainPolicy {
    script: ScriptFlavour::CashAddr,
    amount_decimals: 2,
    ..ChainPolicy::LEGACY
};

const LIQUID_POLICY: ChainPolicy = ChainPolicy {
    script: ScriptFlavour::LiquidPegIn,
    pack: PackPolicy::Envelope,
    ..ChainPolicy::BITCOIN
};

const SNOWGEM_POLICY: ChainPolicy = ChainPolicy {
    tx_format: TxFormat::Zcash,
    pack: PackPolicy::Envelope,
    ..ChainPolicy::LEGACY
};

const PIVX_POLICY: ChainPolicy = ChainPolicy {
    script: ScriptFlavour::Zerocoin,
    block: BlockEnvelope::SaplingCheckpoint,
    tx_format: TxFormat::PivxSapling,
    pack: PackPolicy::Envelope,
    ..ChainPolicy::LEGACY
};

const BYTZ_POLICY: ChainPolicy = ChainPolicy {
    script: ScriptFlavour::Zerocoin,
    block: BlockEnvelope::AccumulatorCheckpoint,
    pack: PackPolicy::Envelope,
    rpc_dialect: RpcDialect::V1,
    ..ChainPolicy::LEGACY
};

const MYRIAD_POLICY: ChainPolicy = ChainPolicy {
    block: BlockEnvelope::AuxPow,
    ..ChainPolicy::BITCOIN
};

/// Segwit chains that store transactions in the protobuf envelope.
const ENVELOPE_POLICY: ChainPolicy = ChainPolicy {
    pack: PackPolicy::Envelope,
    ..ChainPolicy::BITCOIN
};

const VERGE_POLICY: ChainPolicy = ChainPolicy {
    pack: PackPolicy::Envelope,
    ..ChainPolicy::LEGACY
};

const ZCASH_POLICY: ChainPolicy = ChainPolicy {
    tx_format: TxFormat::Zcash,
    pack: PackPolicy::Envelope,
    ..ChainPolicy::LEGACY
};

// ==============================================================================
// Bitcoin Templates
// ==============================================================================

const BITCOIN_MAIN_TEMPLATE: ChainParams = ChainParams {
    coin: Coin::Bitcoin,
    tag: ChainTag::Main,
    magic: 0xd9b4_bef9,
    pubkey_hash_prefix: &[0],
    script_hash_prefix: &[5],
    bech32_hrp: Some("bc"),
    cashaddr_prefix: None,
    checksum_hasher: ChecksumHasher::DoubleSha256,
    xpub_magic: 0x0488_b21e,
    xpub_magic_segwit_p2sh: 0x049d_7cb2,
    xpub_magic_segwit_native: 0x04b2_4746,
    slip44: 0,
};

const BITCOIN_TEST_TEMPLATE: ChainParams = ChainParams {
    tag: ChainTag::Test,
    magic: 0x0709_110b,
    pubkey_hash_prefix: &[111],
    script_hash_prefix: &[196],
    bech32_hrp: Some("tb"),
    xpub_magic: 0x0435_87cf,
    xpub_magic_segwit_p2sh: 0x044a_5262,
    xpub_magic_segwit_native: 0x045f_1cf6,
    slip44: 1,
    ..BITCOIN_MAIN_TEMPLATE
};

const BITCOIN_MAIN: ChainParams = BITCOIN_MAIN_TEMPLATE;
const BITCOIN_TEST: ChainParams = BITCOIN_TEST_TEMPLATE;

const BITCOIN_REGTEST: ChainParams = ChainParams {
    tag: ChainTag::Regtest,
    magic: 0xdab5_bffa,
    bech32_hrp: Some("bcrt"),
    ..BITCOIN_TEST_TEMPLATE
};

const BITCOIN_SIGNET: ChainParams = ChainParams {
    tag: ChainTag::Signet,
    magic: 0x40cf_030a,
    ..BITCOIN_TEST_TEMPLATE
};

// ==============================================================================
// Coins
// ==============================================================================

const LITECOIN_MAIN: ChainParams = ChainParams {
    coin: Coin::Litecoin,
    magic: 0xdbb6_c0fb,
    pubkey_hash_prefix: &[48],
    script_hash_prefix: &[50],
    bech32_hrp: Some("ltc"),
    xpub_magic_segwit_p2sh: 0x01b2_6ef6,
    slip44: 2,
    ..BITCOIN_MAIN_TEMPLATE
};

const LITECOIN_TEST: ChainParams = ChainParams {
    coin: Coin::Litecoin,
    magic: 0xf1c8_d2fd,
    script_hash_prefix: &[58],
    bech32_hrp: Some("tltc"),
    ..BITCOIN_TEST_TEMPLATE
};

const LITECOIN_REGTEST: ChainParams = ChainParams {
    coin: Coin::Litecoin,
    tag: ChainTag::Regtest,
    magic: 0xdab5_bffa,
    script_hash_prefix: &[58],
    bech32_hrp: Some("rltc"),
    ..BITCOIN_TEST_TEMPLATE
};

const DOGECOIN_MAIN: ChainParams = ChainParams {
    coin: Coin::Dogecoin,
    magic: 0xc0c0_c0c0,
    pubkey_hash_prefix: &[30],
    script_hash_prefix: &[22],
    bech32_hrp: None,
    xpub_magic: 0x02fa_cafd,
    slip44: 3,
    ..BITCOIN_MAIN_TEMPLATE
};

const NAMECOIN_MAIN: ChainParams = ChainParams {
    coin: Coin::Namecoin,
    magic: 0xfeb4_bef9,
    pubkey_hash_prefix: &[52],
    script_hash_prefix: &[13],
    bech32_hrp: Some("nc"),
    slip44: 7,
    ..BITCOIN_MAIN_TEMPLATE
};

const GROESTLCOIN_MAIN: ChainParams = ChainParams {
    coin: Coin::Groestlcoin,
    magic: 0xd4b4_bef9,
    pubkey_hash_prefix: &[36],
    script_hash_prefix: &[5],
    bech32_hrp: Some("grs"),
    checksum_hasher: ChecksumHasher::Groestl512D,
    slip44: 17,
    ..BITCOIN_MAIN_TEMPLATE
};

const GROESTLCOIN_TEST: ChainParams = ChainParams {
    coin: Coin::Groestlcoin,
    magic: 0x0709_110b,
    bech32_hrp: Some("tgrs"),
    checksum_hasher: ChecksumHasher::Groestl512D,
    ..BITCOIN_TEST_TEMPLATE
};

const GROESTLCOIN_REGTEST: ChainParams = ChainParams {
    tag: ChainTag::Regtest,
    magic: 0xdab5_bffa,
    bech32_hrp: Some("grsrt"),
    ..GROESTLCOIN_TEST
};

const GROESTLCOIN_SIGNET: ChainParams = ChainParams {
    tag: ChainTag::Signet,
    magic: 0x7696_b422,
    ..GROESTLCOIN_TEST
};

const BITZENY_MAIN: ChainParams = ChainParams {
    coin: Coin::BitZeny,
    magic: 0xf9be_a5da,
    pubkey_hash_prefix: &[81],
    script_hash_prefix: &[5],
    bech32_hrp: Some("bz"),
    slip44: 123,
    ..BITCOIN_MAIN_TEMPLATE
};

const BITZENY_TEST: ChainParams = ChainParams {
    coin: Coin::BitZeny,
    magic: 0x594e_4559,
    bech32_hrp: Some("tz"),
    ..BITCOIN_TEST_TEMPLATE
};

// Monacoin shares its real magics with Litecoin, so the registry keys it by
// distinct placeholder values.
const MONACOIN_MAIN: ChainParams = ChainParams {
    coin: Coin::Monacoin,
    magic: 0x3939_3939,
    pubkey_hash_prefix: &[50],
    script_hash_prefix: &[55],
    bech32_hrp: Some("mona"),
    slip44: 22,
    ..BITCOIN_MAIN_TEMPLATE
};

const MONACOIN_TEST: ChainParams = ChainParams {
    coin: Coin::Monacoin,
    magic: 0x6969_6969,
    script_hash_prefix: &[117],
    bech32_hrp: Some("tmona"),
    ..BITCOIN_TEST_TEMPLATE
};

const VERTCOIN_MAIN: ChainParams = ChainParams {
    coin: Coin::Vertcoin,
    magic: 0xdab5_bffb,
    pubkey_hash_prefix: &[71],
    script_hash_prefix: &[5],
    bech32_hrp: Some("vtc"),
    slip44: 28,
    ..BITCOIN_MAIN_TEMPLATE
};

const VERTCOIN_TEST: ChainParams = ChainParams {
    coin: Coin::Vertcoin,
    magic: 0x7472_6576,
    pubkey_hash_prefix: &[74],
    bech32_hrp: Some("tvtc"),
    ..BITCOIN_TEST_TEMPLATE
};

const VERTCOIN_REGTEST: ChainParams = ChainParams {
    tag: ChainTag::Regtest,
    magic: 0xdab5_bffc,
    ..VERTCOIN_TEST
};

const DASH_MAIN: ChainParams = ChainParams {
    coin: Coin::Dash,
    magic: 0xbd6b_0cbf,
    pubkey_hash_prefix: &[76],
    script_hash_prefix: &[16],
    bech32_hrp: None,
    slip44: 5,
    ..BITCOIN_MAIN_TEMPLATE
};

const DASH_TEST: ChainParams = ChainParams {
    coin: Coin::Dash,
    magic: 0xffca_e2ce,
    pubkey_hash_prefix: &[140],
    script_hash_prefix: &[19],
    bech32_hrp: None,
    ..BITCOIN_TEST_TEMPLATE
};

const DASH_REGTEST: ChainParams = ChainParams {
    tag: ChainTag::Regtest,
    magic: 0xdcb7_c1fc,
    ..DASH_TEST
};

const BITCOIN_GOLD_MAIN: ChainParams = ChainParams {
    coin: Coin::BitcoinGold,
    magic: 0x446d_47e1,
    pubkey_hash_prefix: &[38],
    script_hash_prefix: &[23],
    bech32_hrp: Some("btg"),
    slip44: 156,
    ..BITCOIN_MAIN_TEMPLATE
};

const BITCOIN_GOLD_TEST: ChainParams = ChainParams {
    coin: Coin::BitcoinGold,
    magic: 0x456e_48e2,
    bech32_hrp: Some("tbtg"),
    ..BITCOIN_TEST_TEMPLATE
};

const BITCOIN_GOLD_REGTEST: ChainParams = ChainParams {
    tag: ChainTag::Regtest,
    magic: 0xdab5_bffa,
    ..BITCOIN_GOLD_TEST
};

const ECASH_MAIN: ChainParams = ChainParams {
    coin: Coin::ECash,
    magic: 0xe8f3_e1e3,
    bech32_hrp: None,
    cashaddr_prefix: Some("ecash"),
    slip44: 899,
    ..BITCOIN_MAIN_TEMPLATE
};

const ECASH_TEST: ChainParams = ChainParams {
    coin: Coin::ECash,
    magic: 0xf4f3_e5f4,
    bech32_hrp: None,
    cashaddr_prefix: Some("ectest"),
    ..BITCOIN_TEST_TEMPLATE
};

const ECASH_REGTEST: ChainParams = ChainParams {
    tag: ChainTag::Regtest,
    magic: 0xfabf_b5da,
    cashaddr_prefix: Some("ecreg"),
    ..ECASH_TEST
};

const LIQUID_MAIN: ChainParams = ChainParams {
    coin: Coin::Liquid,
    magic: 0xdab5_bffa,
    pubkey_hash_prefix: &[57],
    script_hash_prefix: &[39],
    bech32_hrp: Some("ex"),
    slip44: 1776,
    ..BITCOIN_MAIN_TEMPLATE
};

const SNOWGEM_MAIN: ChainParams = ChainParams {
    coin: Coin::SnowGem,
    magic: 0x6427_c824,
    pubkey_hash_prefix: &[0x1c, 0x28],
    script_hash_prefix: &[0x1c, 0x2d],
    bech32_hrp: None,
    slip44: 410,
    ..BITCOIN_MAIN_TEMPLATE
};

const SNOWGEM_TEST: ChainParams = ChainParams {
    coin: Coin::SnowGem,
    magic: 0xbff9_1afa,
    pubkey_hash_prefix: &[0x1d, 0x25],
    script_hash_prefix: &[0x1c, 0xba],
    bech32_hrp: None,
    ..BITCOIN_TEST_TEMPLATE
};

const SNOWGEM_REGTEST: ChainParams = ChainParams {
    tag: ChainTag::Regtest,
    magic: 0x5f3f_e8aa,
    ..SNOWGEM_TEST
};

const PIVX_MAIN: ChainParams = ChainParams {
    coin: Coin::Pivx,
    magic: 0xe9fd_c490,
    pubkey_hash_prefix: &[30],
    script_hash_prefix: &[13],
    bech32_hrp: None,
    xpub_magic: 0x022d_2533,
    slip44: 119,
    ..BITCOIN_MAIN_TEMPLATE
};

const PIVX_TEST: ChainParams = ChainParams {
    coin: Coin::Pivx,
    magic: 0xba65_7645,
    pubkey_hash_prefix: &[139],
    script_hash_prefix: &[19],
    bech32_hrp: None,
    ..BITCOIN_TEST_TEMPLATE
};

const BYTZ_MAIN: ChainParams = ChainParams {
    coin: Coin::Bytz,
    magic: 0x81b5_eaa3,
    pubkey_hash_prefix: &[125],
    script_hash_prefix: &[18],
    bech32_hrp: None,
    ..BITCOIN_MAIN_TEMPLATE
};

const BYTZ_TEST: ChainParams = ChainParams {
    coin: Coin::Bytz,
    magic: 0x839f_bb81,
    pubkey_hash_prefix: &[66],
    script_hash_prefix: &[9],
    bech32_hrp: None,
    ..BITCOIN_TEST_TEMPLATE
};

const DIGIBYTE_MAIN: ChainParams = ChainParams {
    coin: Coin::DigiByte,
    magic: 0xdab6_c3fa,
    pubkey_hash_prefix: &[30],
    script_hash_prefix: &[63],
    bech32_hrp: Some("dgb"),
    slip44: 20,
    ..BITCOIN_MAIN_TEMPLATE
};

const DIGIBYTE_TEST: ChainParams = ChainParams {
    coin: Coin::DigiByte,
    magic: 0xddbd_c8fd,
    pubkey_hash_prefix: &[126],
    script_hash_prefix: &[140],
    bech32_hrp: Some("dgbt"),
    ..BITCOIN_TEST_TEMPLATE
};

const VIACOIN_MAIN: ChainParams = ChainParams {
    coin: Coin::Viacoin,
    magic: 0xcbc6_680f,
    pubkey_hash_prefix: &[71],
    script_hash_prefix: &[33],
    bech32_hrp: Some("via"),
    slip44: 14,
    ..BITCOIN_MAIN_TEMPLATE
};

const VIACOIN_TEST: ChainParams = ChainParams {
    coin: Coin::Viacoin,
    magic: 0x92ef_c5a9,
    pubkey_hash_prefix: &[127],
    bech32_hrp: Some("tvia"),
    ..BITCOIN_TEST_TEMPLATE
};

const VIACOIN_REGTEST: ChainParams = ChainParams {
    tag: ChainTag::Regtest,
    magic: 0x377b_972d,
    ..VIACOIN_TEST
};

const MYRIAD_MAIN: ChainParams = ChainParams {
    coin: Coin::Myriad,
    magic: 0xee76_45af,
    pubkey_hash_prefix: &[50],
    script_hash_prefix: &[9],
    bech32_hrp: Some("my"),
    slip44: 90,
    ..BITCOIN_MAIN_TEMPLATE
};

const FUJICOIN_MAIN: ChainParams = ChainParams {
    coin: Coin::Fujicoin,
    magic: 0x696a_7566,
    pubkey_hash_prefix: &[36],
    script_hash_prefix: &[16],
    bech32_hrp: Some("fc"),
    slip44: 75,
    ..BITCOIN_MAIN_TEMPLATE
};

// Fujicoin's regtest reuses this magic, so only testnet is registered.
const FUJICOIN_TEST: ChainParams = ChainParams {
    coin: Coin::Fujicoin,
    magic: 0x6675_6a69,
    pubkey_hash_prefix: &[74],
    bech32_hrp: Some("tfc"),
    ..BITCOIN_TEST_TEMPLATE
};

const FLO_MAIN: ChainParams = ChainParams {
    coin: Coin::Flo,
    magic: 0xf1a5_c0fd,
    pubkey_hash_prefix: &[35],
    script_hash_prefix: &[94],
    bech32_hrp: Some("flo"),
    slip44: 216,
    ..BITCOIN_MAIN_TEMPLATE
};

const FLO_TEST: ChainParams = ChainParams {
    coin: Coin::Flo,
    magic: 0xf25a_c0fd,
    pubkey_hash_prefix: &[115],
    script_hash_prefix: &[198],
    bech32_hrp: Some("tflo"),
    ..BITCOIN_TEST_TEMPLATE
};

const FLO_REGTEST: ChainParams = ChainParams {
    tag: ChainTag::Regtest,
    magic: 0xdab5_bffa,
    ..FLO_TEST
};

const KOTO_MAIN: ChainParams = ChainParams {
    coin: Coin::Koto,
    magic: 0x6f74_6f4b,
    pubkey_hash_prefix: &[0x18, 0x36],
    script_hash_prefix: &[0x18, 0x3b],
    bech32_hrp: None,
    slip44: 510,
    ..BITCOIN_MAIN_TEMPLATE
};

const KOTO_TEST: ChainParams = ChainParams {
    coin: Coin::Koto,
    magic: 0x6f6b_6f54,
    pubkey_hash_prefix: &[0x18, 0xa4],
    script_hash_prefix: &[0x18, 0x39],
    bech32_hrp: None,
    ..BITCOIN_TEST_TEMPLATE
};

const KOTO_REGTEST: ChainParams = ChainParams {
    tag: ChainTag::Regtest,
    magic: 0x6f6b_6552,
    ..KOTO_TEST
};

const ZCASH_MAIN: ChainParams = ChainParams {
    coin: Coin::Zcash,
    magic: 0x6427_e924,
    pubkey_hash_prefix: &[0x1c, 0xb8],
    script_hash_prefix: &[0x1c, 0xbd],
    bech32_hrp: None,
    slip44: 133,
    ..BITCOIN_MAIN_TEMPLATE
};

const ZCASH_TEST: ChainParams = ChainParams {
    coin: Coin::Zcash,
    magic: 0xbff9_1afa,
    pubkey_hash_prefix: &[0x1d, 0x25],
    script_hash_prefix: &[0x1c, 0xba],
    bech32_hrp: None,
    ..BITCOIN_TEST_TEMPLATE
};

const ZCASH_REGTEST: ChainParams = ChainParams {
    tag: ChainTag::Regtest,
    magic: 0x5f3f_e8aa,
    ..ZCASH_TEST
};

const DEEPONION_MAIN: ChainParams = ChainParams {
    coin: Coin::DeepOnion,
    magic: 0xf2db_f1d1,
    pubkey_hash_prefix: &[31],
    script_hash_prefix: &[78],
    bech32_hrp: Some("dpn"),
    slip44: 305,
    ..BITCOIN_MAIN_TEMPLATE
};

const FEATHERCOIN_MAIN: ChainParams = ChainParams {
    coin: Coin::Feathercoin,
    magic: 0x211a_1541,
    pubkey_hash_prefix: &[14],
    script_hash_prefix: &[5],
    bech32_hrp: Some("fc"),
    slip44: 8,
    ..BITCOIN_MAIN_TEMPLATE
};

const GAMECREDITS_MAIN: ChainParams = ChainParams {
    coin: Coin::GameCredits,
    magic: 0xdbb6_c0fb,
    pubkey_hash_prefix: &[38],
    script_hash_prefix: &[62],
    bech32_hrp: Some("game"),
    slip44: 101,
    ..BITCOIN_MAIN_TEMPLATE
};

const GAMECREDITS_TEST: ChainParams = ChainParams {
    coin: Coin::GameCredits,
    script_hash_prefix: &[58],
    bech32_hrp: Some("tgame"),
    ..BITCOIN_TEST_TEMPLATE
};

const GAMECREDITS_REGTEST: ChainParams = ChainParams {
    tag: ChainTag::Regtest,
    magic: 0xdab5_bffa,
    ..GAMECREDITS_TEST
};

const BELLCOIN_MAIN: ChainParams = ChainParams {
    coin: Coin::Bellcoin,
    magic: 0xbeba_cefa,
    pubkey_hash_prefix: &[25],
    script_hash_prefix: &[85],
    bech32_hrp: Some("bm"),
    slip44: 25252,
    ..BITCOIN_MAIN_TEMPLATE
};

const BELLCOIN_TEST: ChainParams = ChainParams {
    coin: Coin::Bellcoin,
    bech32_hrp: Some("bt"),
    ..BITCOIN_TEST_TEMPLATE
};

const CPUCHAIN_MAIN: ChainParams = ChainParams {
    coin: Coin::CpuChain,
    magic: 0xefbe_adde,
    pubkey_hash_prefix: &[28],
    script_hash_prefix: &[30],
    bech32_hrp: Some("cpu"),
    slip44: 363,
    ..BITCOIN_MAIN_TEMPLATE
};

const CPUCHAIN_TEST: ChainParams = ChainParams {
    coin: Coin::CpuChain,
    magic: 0x0cb0_cefa,
    bech32_hrp: Some("tcpu"),
    ..BITCOIN_TEST_TEMPLATE
};

const BITCORE_MAIN: ChainParams = ChainParams {
    coin: Coin::Bitcore,
    magic: 0xf9be_b4d9,
    pubkey_hash_prefix: &[3],
    script_hash_prefix: &[125],
    bech32_hrp: Some("btx"),
    slip44: 160,
    ..BITCOIN_MAIN_TEMPLATE
};

const BITCORE_TEST: ChainParams = ChainParams {
    coin: Coin::Bitcore,
    magic: 0xfdd2_c8f1,
    bech32_hrp: Some("tbtx"),
    ..BITCOIN_TEST_TEMPLATE
};

const BITCORE_REGTEST: ChainParams = ChainParams {
    tag: ChainTag::Regtest,
    magic: 0xfabf_b5da,
    ..BITCORE_TEST
};

// Polis is a Dash fork and keeps Dash's magics.
const POLIS_MAIN: ChainParams = ChainParams {
    coin: Coin::Polis,
    pubkey_hash_prefix: &[55],
    script_hash_prefix: &[56],
    slip44: 1997,
    ..DASH_MAIN
};

const POLIS_TEST: ChainParams = ChainParams {
    coin: Coin::Polis,
    ..DASH_TEST
};

const POLIS_REGTEST: ChainParams = ChainParams {
    tag: ChainTag::Regtest,
    magic: 0xdcb7_c1fc,
    ..POLIS_TEST
};

const VERGE_MAIN: ChainParams = ChainParams {
    coin: Coin::Verge,
    magic: 0xff7e_a7f7,
    pubkey_hash_prefix: &[30],
    script_hash_prefix: &[33],
    bech32_hrp: Some("xvg"),
    slip44: 77,
    ..BITCOIN_MAIN_TEMPLATE
};

const VIPSTARCOIN_MAIN: ChainParams = ChainParams {
    coin: Coin::Vipstarcoin,
    magic: 0x012c_e7b5,
    pubkey_hash_prefix: &[70],
    script_hash_prefix: &[50],
    bech32_hrp: Some("vips"),
    slip44: 1919,
    ..BITCOIN_MAIN_TEMPLATE
};

const VIPSTARCOIN_TEST: ChainParams = ChainParams {
    coin: Coin::Vipstarcoin,
    magic: 0x1a2b_3c4d,
    pubkey_hash_prefix: &[132],
    script_hash_prefix: &[110],
    bech32_hrp: Some("tvips"),
    ..BITCOIN_TEST_TEMPLATE
};
