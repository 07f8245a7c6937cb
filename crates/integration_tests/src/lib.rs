// Copyright (C) 2026 Parity Technologies (UK) Ltd.
// SPDX-License-Identifier: GPL-3.0-or-later

pub mod fixtures;
pub mod utils;

pub use fixtures::FixtureLoader;
pub use utils::*;

/// Well-known development accounts used across the fixtures.
pub mod constants {
    pub const ALICE_HEX: &str =
        "0xd43593c715fdd31c61141abd04a99fd6822c8558854ccde39a5684e7a56da27d";
    pub const BOB_HEX: &str = "0x8eaf04151687736326c9fea17e25fc5287613693c912909cb226aa4794f26a48";
    pub const CHARLIE_HEX: &str =
        "0x90b5ab205c6974c9ea841be688864633dc9ca8a357843eeacf2314649965fe22";
    pub const DAVE_HEX: &str = "0x306721211d5404bd9da88e0204360a1a9ab8b87c66c1bc2fcdd37f3c2222cc20";

    /// Polkadot (prefix 0) encodings
    pub const ALICE: &str = "15oF4uVJwmo4TdGW7VfQxNLavjCXviqxT9S1MgbjMNHr6Sp5";
    pub const BOB: &str = "14E5nqKAp3oAJcmzgZhUD2RcptBeUBScxKHgJKU4HPNcKVf3";
    pub const CHARLIE: &str = "14Gjs1TD93gnwEBfDMHoCgsuf1s2TVKUP6Z1qKmAZnZ8cW5q";
    pub const DAVE: &str = "126TwBzBM4jUEK2gTphmW4oLoBWWnYvPp8hygmduTr4uds57";

    /// Generic substrate (prefix 42) encoding of Alice
    pub const ALICE_GENERIC: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

    /// 2-of-3 multisig over Alice, Bob and Charlie at prefix 0
    pub const ALICE_BOB_CHARLIE_2: &str = "12fqSn9qVLJL4NY7Uua7bexEAVr9oCpD3e5xmdpNjtQszzBt";
}
