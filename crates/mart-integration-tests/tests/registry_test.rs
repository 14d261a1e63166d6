//! Integration tests for the asset registry and coin ledger collaborators.
//!
//! Covers the ownership semantics the marketplace relies on:
//! 1. Minting assigns sequential ids starting at 1
//! 2. Approved spenders can transfer on the owner's behalf, once
//! 3. Owner enumeration by index
//! 4. Snapshots survive reopening

use mart_token::{Address, AssetId, AssetRegistry, CoinLedger, NftRegistry, PaymentRail, RegistryId, TokenError, Wei};

// ============================================================================
// Helper Functions
// ============================================================================

fn addr(s: &str) -> Address {
    Address::new(s).expect("address")
}

fn registry() -> NftRegistry {
    NftRegistry::new(RegistryId::new("example-nft"))
}

// ============================================================================
// Ownership
// ============================================================================

#[test]
fn mint_two_assets() {
    let nft = registry();
    let owner = addr("owner");

    assert_eq!(nft.mint(&owner), AssetId::new(1));
    assert_eq!(nft.mint(&owner), AssetId::new(2));

    assert_eq!(nft.owner_of(AssetId::new(1)).expect("owner"), owner);
    assert_eq!(nft.owner_of(AssetId::new(2)).expect("owner"), owner);
    assert_eq!(nft.balance_of(&owner), 2);
}

#[test]
fn approved_spender_transfers() {
    let nft = registry();
    let (user1, user2) = (addr("user1"), addr("user2"));
    let token = nft.mint(&user1);

    nft.approve(&user1, &user2, token).expect("approve");
    nft.transfer_from(&user2, &user1, &user2, token).expect("transfer");

    assert_eq!(nft.owner_of(token).expect("owner"), user2);
    assert!(nft.get_approved(token).expect("approved").is_none());
}

#[test]
fn approval_is_single_use() {
    let nft = registry();
    let (owner, spender, other) = (addr("owner"), addr("spender"), addr("other"));
    let token = nft.mint(&owner);
    nft.approve(&owner, &spender, token).expect("approve");
    nft.transfer_from(&spender, &owner, &other, token).expect("transfer");

    let err = nft.transfer_from(&spender, &other, &spender, token).unwrap_err();
    assert!(matches!(err, TokenError::NotAuthorized { .. }));
}

#[test]
fn only_owner_approves() {
    let nft = registry();
    let token = nft.mint(&addr("owner"));
    let err = nft.approve(&addr("mallory"), &addr("mallory"), token).unwrap_err();
    assert!(matches!(err, TokenError::NotOwner { .. }));
}

#[test]
fn unknown_token() {
    let nft = registry();
    assert!(matches!(
        nft.owner_of(AssetId::new(9)),
        Err(TokenError::TokenNotFound { .. })
    ));
}

#[test]
fn enumerate_owner_tokens() {
    let nft = registry();
    let (alice, bob) = (addr("alice"), addr("bob"));
    let a1 = nft.mint(&alice);
    let _b1 = nft.mint(&bob);
    let a2 = nft.mint(&alice);

    assert_eq!(nft.token_of_owner_by_index(&alice, 0).expect("index 0"), a1);
    assert_eq!(nft.token_of_owner_by_index(&alice, 1).expect("index 1"), a2);
    assert!(matches!(
        nft.token_of_owner_by_index(&alice, 2),
        Err(TokenError::IndexOutOfBounds { balance: 2, .. })
    ));
    assert_eq!(nft.tokens_of(&alice), vec![a1, a2]);
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn registry_and_balances_survive_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let id = RegistryId::new("example-nft");
    let alice = addr("alice");

    {
        let nft = NftRegistry::open(id.clone(), dir.path()).expect("open");
        nft.mint(&alice);
        let coins = CoinLedger::open(dir.path()).expect("open");
        coins.faucet(&alice, Wei::from_ether(3)).expect("faucet");
    }

    let nft = NftRegistry::open(id, dir.path()).expect("reopen");
    assert_eq!(nft.owner_of(AssetId::new(1)).expect("owner"), alice);
    assert_eq!(nft.mint(&alice), AssetId::new(2));

    let coins = CoinLedger::open(dir.path()).expect("reopen");
    assert_eq!(coins.balance_of(&alice), Wei::from_ether(3));
}
