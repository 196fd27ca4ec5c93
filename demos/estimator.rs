use hllpp::Hll;

fn main() {
    let mut shard1 = Hll::new(14, 25);
    for i in 0..10_000u64 {
        shard1.insert(&i);
    }
    println!("shard1 estimate = {}", shard1.cardinality());

    let mut shard2 = Hll::new(14, 25);
    for i in 5_000..15_000u64 {
        shard2.insert(&i);
    }
    println!("shard2 estimate = {}", shard2.cardinality());

    shard1.combine(&mut shard2);
    println!("union estimate = {}", shard1.cardinality());

    let wire = shard1.marshal().expect("marshal failed");
    println!("wire form: {} bytes", wire.len());
    let mut restored = Hll::unmarshal(&wire).expect("unmarshal failed");
    println!("restored estimate = {}", restored.cardinality());
}
