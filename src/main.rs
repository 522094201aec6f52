use std::sync::Arc;

use dotenvy::dotenv;
use log::warn;

use rust_consensus_ledger::blockchain::race_miners;
use rust_consensus_ledger::{
    Config, Ledger, MineOutcome, Signer, StakeRegistry, Transaction, Wallet,
};

fn main() -> anyhow::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = Config::from_env()?;
    println!(
        "⛓️ Starting ledger simulation (difficulty={}, reward={}, miners={})",
        config.difficulty, config.reward, config.miners
    );

    let ledger = Arc::new(Ledger::from_config(&config)?);
    let registry = StakeRegistry::new();
    let wallet = Wallet::generate();

    ledger.add_transaction("Alice -> Bob: 5 BTC");
    ledger.add_transaction("Bob -> Charlie: 2 BTC");
    ledger.add_transaction(
        Transaction::transfer(wallet.public_key(), "Charlie", 1.5).signed(&wallet),
    );

    // Miners race for the same pending pool
    let miners = (1..=config.miners).map(|i| format!("Miner{i}"));
    for report in race_miners(&ledger, miners, 1)? {
        for outcome in report.outcomes {
            match outcome {
                Ok(MineOutcome::Mined { miner, index, hash }) => {
                    println!("Miner {miner} mined block {index} with hash {hash}")
                }
                Ok(MineOutcome::NothingToMine) => {
                    println!("No transactions to mine for {}", report.miner)
                }
                Err(e) => warn!("{} failed: {e}", report.miner),
            }
        }
    }

    // Staking and validator selection
    registry.stake("Validator1", 50.0)?;
    registry.stake("Validator2", 30.0)?;
    registry.stake("Validator3", 20.0)?;

    let snapshot = ledger.pending_transactions();
    match registry.validate_block(&snapshot) {
        Some(validator) => println!(
            "Validator {validator} approved {} transactions",
            snapshot.len()
        ),
        None => println!("No validator holds stake"),
    }

    for block in ledger.chain() {
        let txs: Vec<String> = block.transactions.iter().map(ToString::to_string).collect();
        println!(
            "Block {}: Hash {}, Prev Hash {}, Transactions: {:?}",
            block.index,
            block.hash.as_deref().unwrap_or("-"),
            block.previous_hash,
            txs
        );
    }
    println!("Chain valid: {}", ledger.is_valid_chain());
    println!("{}", ledger.chain_json()?);

    Ok(())
}
