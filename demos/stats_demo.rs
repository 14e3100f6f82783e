use std::collections::hash_map::DefaultHasher;
use std::hash::BuildHasherDefault;

use chain_hash::ChainedHashMap;
use chain_hash::DEFAULT_MAX_LOAD_FACTOR;
use chain_hash::DEFAULT_STARTING_CAPACITY;
use chain_hash::MapConfig;
use clap::Parser;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'n', long = "keys", default_value_t = 1000)]
    keys: u64,

    #[arg(short = 'c', long = "starting_capacity", default_value_t = DEFAULT_STARTING_CAPACITY)]
    starting_capacity: usize,

    #[arg(short = 'l', long = "max_load_factor", default_value_t = DEFAULT_MAX_LOAD_FACTOR)]
    max_load_factor: f64,

    /// Remove every other key after filling the map.
    #[arg(long)]
    remove_half: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = MapConfig::new(args.starting_capacity, args.max_load_factor)?;
    println!("Creating ChainedHashMap with {:?}", config);

    let mut map: ChainedHashMap<u64, u64, BuildHasherDefault<DefaultHasher>> =
        ChainedHashMap::with_config(config);

    println!("Filling map with {} u64 keys...", args.keys);
    let mut resizes = 0;
    for key in 0..args.keys {
        let before = map.capacity();
        map.add(key, key * 2)?;
        if map.capacity() != before {
            resizes += 1;
        }
    }

    if args.remove_half {
        for key in (0..args.keys).step_by(2) {
            map.remove(&key)?;
        }
        println!("Removed every other key, {} remain", map.len());
    }

    println!(
        "Inserted {} keys, {} resizes, final capacity {}",
        args.keys,
        resizes,
        map.capacity()
    );
    println!("Final load factor: {:.2}%", map.load_factor() * 100.0);

    map.print_chain_histogram();
    map.debug_stats().print();

    Ok(())
}
