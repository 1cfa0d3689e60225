// CLI commands

use clap::{Parser, Subcommand};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::path::PathBuf;
use crate::consensus::{is_valid_chain, is_valid_mineable_chain, validate_mineable_chain, MiningResult};
use crate::core::{BlockData, ChainView, Transaction};
use crate::ledger::{LedgerConfig, MineableChain};
use crate::wallet::{Address, KeyPair, Keystore};

#[derive(Parser)]
#[command(name = "hashledger")]
#[command(about = "Proof-of-work ledger with tamper and balance audits", long_about = None)]
pub struct Cli {
    /// JSON file with difficulty, reward and max_attempts
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Required leading zero hex digits
    #[arg(short, long, global = true)]
    pub difficulty: Option<usize>,

    /// Reward paid to the miner of each block
    #[arg(short, long, global = true)]
    pub reward: Option<i64>,

    /// Give up mining a block after this many hashes
    #[arg(long, global = true)]
    pub max_attempts: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mine empty blocks with a fresh key
    Mine {
        /// Number of blocks to mine
        #[arg(short, long, default_value = "3")]
        blocks: usize,
    },

    /// Mine rounds of random transfers between a few keys
    Simulate {
        /// Number of mining rounds
        #[arg(long, default_value = "5")]
        rounds: usize,
        /// Transfers submitted per round
        #[arg(long, default_value = "3")]
        transfers: usize,
        /// Number of participating keys
        #[arg(long, default_value = "3")]
        parties: usize,
    },
}

impl Cli {
    /// Defaults, then the config file, then command-line overrides
    pub fn ledger_config(&self) -> Result<LedgerConfig, String> {
        let mut config = match &self.config {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                LedgerConfig::load(path).map_err(|e| e.to_string())?
            }
            None => LedgerConfig::default(),
        };

        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(reward) = self.reward {
            config.reward = reward;
        }
        if self.max_attempts.is_some() {
            config.max_attempts = self.max_attempts;
        }

        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }
}

/// CLI handler
pub struct CliHandler {
    chain: MineableChain,
    keystore: Keystore,
}

impl CliHandler {
    /// Create a handler around a fresh in-memory ledger
    pub fn new(config: &LedgerConfig) -> Result<Self, String> {
        let chain = MineableChain::from_config(config).map_err(|e| e.to_string())?;
        log::info!("New ledger: difficulty {}, reward {}", chain.difficulty(), chain.reward());

        Ok(Self {
            chain,
            keystore: Keystore::new(),
        })
    }

    /// Handle CLI command
    pub fn handle(&mut self, command: Commands) -> Result<(), String> {
        match command {
            Commands::Mine { blocks } => self.mine(blocks),
            Commands::Simulate { rounds, transfers, parties } => {
                self.simulate(rounds, transfers, parties)
            }
        }
    }

    fn mine(&mut self, blocks: usize) -> Result<(), String> {
        let address = self.keystore.new_address();
        let key = self.key(&address)?;

        println!("Mining {} blocks for {}", blocks, address);
        for _ in 0..blocks {
            let result = self.chain.mine(&key).map_err(|e| e.to_string())?;
            self.print_mined(&result);
        }

        self.print_summary();
        Ok(())
    }

    fn simulate(&mut self, rounds: usize, transfers: usize, parties: usize) -> Result<(), String> {
        if parties < 2 {
            return Err("Simulation needs at least 2 parties".to_string());
        }

        for _ in 0..parties {
            self.keystore.new_address();
        }
        let addresses = self.keystore.list_addresses();
        let mut rng = rand::thread_rng();

        // Fund every party once so transfers have something to spend
        for address in &addresses {
            let key = self.key(address)?;
            let result = self.chain.mine(&key).map_err(|e| e.to_string())?;
            self.print_mined(&result);
        }

        for round in 1..=rounds {
            let mut committed: HashMap<Address, i64> = HashMap::new();

            for _ in 0..transfers {
                let mut pair = addresses.choose_multiple(&mut rng, 2);
                let (Some(from), Some(to)) = (pair.next(), pair.next()) else {
                    continue;
                };
                let sender = self.key(from)?;
                let recipient = self.key(to)?;

                let spent = committed.get(from).copied().unwrap_or(0);
                let unspent = self.chain.balance(&sender.public_key) - i128::from(spent);
                let spendable = i64::try_from(unspent).unwrap_or(i64::MAX);
                if spendable <= 0 {
                    continue;
                }

                let amount = rng.gen_range(1..=spendable);
                *committed.entry(from.clone()).or_insert(0) += amount;
                self.chain.add_transaction(Transaction::new(&sender, recipient.public_key, amount));
                println!("  round {}: {} -> {} ({})", round, from, to, amount);
            }

            let Some(miner_address) = addresses.choose(&mut rng) else {
                continue;
            };
            let miner = self.key(miner_address)?;
            let result = self.chain.mine(&miner).map_err(|e| e.to_string())?;
            self.print_mined(&result);
        }

        println!("Balances ({} parties):", self.keystore.count());
        for address in &addresses {
            let key = self.key(address)?;
            println!("  {}  {}", address, self.chain.balance(&key.public_key));
        }

        self.print_summary();
        Ok(())
    }

    fn key(&self, address: &Address) -> Result<KeyPair, String> {
        self.keystore
            .get_keypair(address)
            .cloned()
            .ok_or_else(|| format!("Address not found in keystore: {}", address))
    }

    /// Address that collected the head block's reward, if it is one of ours
    fn head_miner(&self) -> Option<Address> {
        let head = self.chain.head()?;
        let reward = head.transactions().iter().find(|tx| tx.is_reward())?;
        self.keystore
            .find_by_public_key(&reward.recipient)
            .map(|key| key.address.clone())
    }

    fn print_mined(&self, result: &MiningResult) {
        let txs = self.chain.head().map_or(0, |block| block.transactions().len());
        println!("Block {}:", self.chain.height() - 1);
        println!("  Hash: {}", result.hash);
        println!("  Nonce: {}", result.nonce);
        if let Some(miner) = self.head_miner() {
            println!("  Miner: {}", miner);
        }
        println!("  Transactions: {}", txs);
        println!("  Attempts: {} ({:.0} H/s)", result.attempts, result.hash_rate());
    }

    fn print_summary(&self) {
        println!("Ledger:");
        println!("  Height: {}", self.chain.height());
        println!("  Difficulty: {}", self.chain.difficulty());
        println!("  Chain audit: {}", verdict(is_valid_chain(&self.chain)));
        println!("  Mined-chain audit: {}", verdict(is_valid_mineable_chain(&self.chain)));
        if let Err(e) = validate_mineable_chain(&self.chain) {
            println!("  Reason: {}", e);
        }
    }
}

fn verdict(valid: bool) -> &'static str {
    if valid { "valid" } else { "INVALID" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = parse(&["hashledger", "--difficulty", "1", "--reward", "9", "mine", "--blocks", "2"]);
        let config = cli.ledger_config().unwrap();

        assert_eq!(config.difficulty, 1);
        assert_eq!(config.reward, 9);
        assert_eq!(config.max_attempts, None);
        assert!(matches!(cli.command, Commands::Mine { blocks: 2 }));
    }

    #[test]
    fn test_rejects_non_positive_reward() {
        let cli = parse(&["hashledger", "--reward", "0", "mine"]);
        assert!(cli.ledger_config().is_err());
    }

    #[test]
    fn test_rejects_unreachable_difficulty() {
        let cli = parse(&["hashledger", "-d", "65", "mine"]);
        assert!(cli.ledger_config().unwrap_err().contains("difficulty"));

        let cli = parse(&["hashledger", "-d", "64", "mine"]);
        assert_eq!(cli.ledger_config().unwrap().difficulty, 64);
    }

    #[test]
    fn test_missing_config_file() {
        let cli = parse(&["hashledger", "--config", "/nonexistent/ledger.json", "mine"]);
        assert!(cli.ledger_config().unwrap_err().contains("Config error"));
    }

    #[test]
    fn test_mine_command() {
        let config = LedgerConfig { difficulty: 0, reward: 5, max_attempts: None };
        let mut handler = CliHandler::new(&config).unwrap();

        handler.handle(Commands::Mine { blocks: 2 }).unwrap();
        assert_eq!(handler.chain.height(), 3);
        assert!(is_valid_mineable_chain(&handler.chain));

        let miner = handler.head_miner().unwrap();
        assert_eq!(handler.keystore.list_addresses(), vec![miner]);
    }

    #[test]
    fn test_simulate_keeps_balances_non_negative() {
        let config = LedgerConfig { difficulty: 1, reward: 10, max_attempts: None };
        let mut handler = CliHandler::new(&config).unwrap();

        handler
            .handle(Commands::Simulate { rounds: 3, transfers: 4, parties: 3 })
            .unwrap();

        assert_eq!(handler.chain.height(), 1 + 3 + 3);
        assert_eq!(handler.keystore.count(), 3);
        assert!(handler.head_miner().is_some());
        assert!(is_valid_mineable_chain(&handler.chain));
        assert!(is_valid_chain(&handler.chain));
    }

    #[test]
    fn test_simulate_needs_two_parties() {
        let mut handler = CliHandler::new(&LedgerConfig::default()).unwrap();
        assert!(handler
            .handle(Commands::Simulate { rounds: 1, transfers: 1, parties: 1 })
            .is_err());
    }

    #[test]
    fn test_exhausted_mining_reported() {
        let config = LedgerConfig { difficulty: 64, reward: 1, max_attempts: Some(2) };
        let mut handler = CliHandler::new(&config).unwrap();

        let err = handler.handle(Commands::Mine { blocks: 1 }).unwrap_err();
        assert!(err.contains("2 attempts"));
    }
}
