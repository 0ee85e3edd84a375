//! Codecs and parser through the public API.

use bitcoin::hex::{DisplayHex, FromHex};
use bitcoin::{Amount, Txid};
use bitdex_core::{Coin, Parser, ScriptType};

// Bitcoin genesis coinbase.
const GENESIS_TX: &str = "01000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000";
const GENESIS_TXID: &str = "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b";

#[test]
fn genesis_coinbase() {
    let parser = Parser::for_coin(Coin::Bitcoin, "main").expect("parser");
    let tx = parser.parse_tx_hex(GENESIS_TX).expect("genesis tx");
    assert_eq!(tx.txid, GENESIS_TXID.parse::<Txid>().expect("txid"));
    assert!(tx.is_coinbase());
    assert_eq!(tx.outputs.len(), 1);
    assert_eq!(tx.outputs[0].value, Amount::from_sat(5_000_000_000));
    assert_eq!(tx.outputs[0].addresses, ["1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa"]);

    let classified = parser
        .classifier()
        .script_to_addresses(&tx.outputs[0].script_pubkey);
    assert_eq!(classified.script_type, ScriptType::P2pk);
    assert!(!classified.searchable);

    // P2PK is indexed under the P2PKH script of its key.
    let desc = parser
        .classifier()
        .addr_desc_from_output(&tx.outputs[0].script_pubkey);
    assert_eq!(
        desc.to_string(),
        "76a91462e907b15cbf27d5425399ebf6f0fb50ebb88f1888ac"
    );
}

#[test]
fn bitcoin_address_vectors() {
    let parser = Parser::for_coin(Coin::Bitcoin, "main").expect("parser");
    let codec = parser.codec();
    let cases = [
        (
            "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa",
            "76a91462e907b15cbf27d5425399ebf6f0fb50ebb88f1888ac",
        ),
        (
            "1JKgN43B9SyLuZH19H5ECvr4KcfrbVHzZ6",
            "76a914be027bf3eac907bd4ac8cb9c5293b6f37662722088ac",
        ),
        (
            "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4",
            "0014751e76e8199196d454941c45d1b3a323f1433bd6",
        ),
    ];
    for (address, script) in cases {
        let decoded = codec.address_to_script(address).expect(address);
        assert_eq!(decoded.as_bytes().to_lower_hex_string(), script);
        let script = Vec::<u8>::from_hex(script).expect("hex");
        let encoded = codec
            .script_to_address(bitcoin::Script::from_bytes(&script))
            .expect("encodable");
        assert_eq!(encoded, address);
    }
    assert!(codec.address_to_script("1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNb").is_err());
}

#[test]
fn confirmed_tx_survives_packing() {
    let parser = Parser::for_coin(Coin::Bitcoin, "main").expect("parser");
    let tx = parser.parse_tx_hex(GENESIS_TX).expect("genesis tx");
    let packed = parser.pack_tx(&tx, 0, 1_231_006_505).expect("pack");
    let (unpacked, height) = parser.unpack_tx(&packed).expect("unpack");
    assert_eq!(height, 0);
    assert_eq!(unpacked.txid, tx.txid);
    assert_eq!(unpacked.outputs, tx.outputs);
    assert_eq!(unpacked.block_time, Some(1_231_006_505));
}
