//! Value Converter: `ScVal` -> public `Value`, and address -> canonical
//! strkey. Raw byte forms of addresses never leave this module.

use stellar_xdr::curr::{Int128Parts, Int256Parts, ScAddress, ScVal, UInt128Parts, UInt256Parts};
use stellar_strkey::{Contract, ed25519};

use crate::model::Value;

/// Convert a single `ScVal` into the public `Value` representation.
pub fn convert(val: &ScVal) -> Value {
    match val {
        ScVal::Bool(b) => Value::Bool(*b),
        ScVal::Void => Value::Void,
        ScVal::U32(v) => Value::U32(*v),
        ScVal::I32(v) => Value::I32(*v),
        ScVal::U64(v) => Value::U64(*v),
        ScVal::I64(v) => Value::I64(*v),
        ScVal::Timepoint(t) => Value::U64(t.0),
        ScVal::Duration(d) => Value::U64(d.0),
        ScVal::U128(parts) => Value::U128(u128_from_parts(parts).to_string()),
        ScVal::I128(parts) => Value::I128(i128_from_parts(parts).to_string()),
        ScVal::U256(parts) => Value::U256(u256_decimal_string(parts)),
        ScVal::I256(parts) => Value::I256(i256_decimal_string(parts)),
        ScVal::Bytes(b) => Value::Bytes(b.to_vec()),
        ScVal::String(s) => Value::String(String::from_utf8_lossy(s.as_slice()).into_owned()),
        ScVal::Symbol(s) => Value::Symbol(String::from_utf8_lossy(s.as_slice()).into_owned()),
        ScVal::Address(addr) => Value::Address(encode_address(addr)),
        ScVal::Vec(Some(items)) => Value::Vec(items.iter().map(convert).collect()),
        ScVal::Vec(None) => Value::Vec(Vec::new()),
        ScVal::Map(Some(entries)) => Value::Map(
            entries
                .iter()
                .map(|entry| (convert(&entry.key), convert(&entry.val)))
                .collect(),
        ),
        ScVal::Map(None) => Value::Map(Vec::new()),
        ScVal::ContractInstance(_) => Value::Other("contract_instance".to_string()),
        ScVal::LedgerKeyContractInstance => Value::Other("ledger_key_contract_instance".to_string()),
        ScVal::LedgerKeyNonce(nonce) => Value::I64(nonce.nonce),
        ScVal::Error(e) => Value::Other(format!("{:?}", e)),
    }
}

/// Decode a function-name byte string. Soroban function names are ASCII
/// symbols; lossy UTF-8 is acceptable here since the result is only used
/// for filtering/display, never re-encoded onto the wire.
pub fn function_name_to_string(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Encode a contract ID hash to its canonical `C...` strkey form.
pub fn encode_contract_id(hash: &[u8; 32]) -> String {
    Contract(*hash).to_string()
}

/// Encode an ed25519 account public key to its canonical `G...` strkey form.
pub fn encode_account_id(key: &[u8; 32]) -> String {
    ed25519::PublicKey(*key).to_string()
}

/// Resolve an `ScAddress` (contract or account) to canonical strkey.
pub fn encode_address(addr: &ScAddress) -> String {
    match addr {
        ScAddress::Contract(contract_id) => encode_contract_id(&contract_id.0 .0),
        ScAddress::Account(account_id) => {
            let stellar_xdr::curr::PublicKey::PublicKeyTypeEd25519(key) = &account_id.0;
            encode_account_id(&key.0)
        }
    }
}

fn u128_from_parts(parts: &UInt128Parts) -> u128 {
    ((parts.hi as u128) << 64) | parts.lo as u128
}

fn i128_from_parts(parts: &Int128Parts) -> i128 {
    ((parts.hi as i128) << 64) | parts.lo as i128
}

/// u256 has no native Rust integer type; render as an unsigned decimal
/// string built from the four 64-bit limbs.
fn u256_decimal_string(parts: &UInt256Parts) -> String {
    let limbs = [parts.hi_hi, parts.hi_lo, parts.lo_hi, parts.lo_lo];
    decimal_from_be_u64_limbs(&limbs, false)
}

fn i256_decimal_string(parts: &Int256Parts) -> String {
    let negative = parts.hi_hi < 0;
    let hi_hi = parts.hi_hi as u64;
    let limbs = [hi_hi, parts.hi_lo, parts.lo_hi, parts.lo_lo];
    decimal_from_be_u64_limbs(&limbs, negative)
}

/// Render big-endian 64-bit limbs as a base-10 string via repeated
/// divide-by-10, accumulating digits least-significant-first.
fn decimal_from_be_u64_limbs(limbs: &[u64; 4], negative: bool) -> String {
    let mut digits = [0u64; 4];
    digits.copy_from_slice(limbs);

    if digits.iter().all(|&d| d == 0) {
        return "0".to_string();
    }

    let mut out = Vec::new();
    while digits.iter().any(|&d| d != 0) {
        let mut remainder: u128 = 0;
        for limb in digits.iter_mut() {
            let acc = (remainder << 64) | *limb as u128;
            *limb = (acc / 10) as u64;
            remainder = acc % 10;
        }
        out.push(b'0' + remainder as u8);
    }
    out.reverse();
    let mut s = if negative { "-".to_string() } else { String::new() };
    s.push_str(std::str::from_utf8(&out).unwrap());
    s
}
