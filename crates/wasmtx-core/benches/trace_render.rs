use criterion::{black_box, criterion_group, criterion_main, Criterion};

use wasmtx_core::codec::Writer;
use wasmtx_core::engine::{Script, ScriptedEngine};
use wasmtx_core::native::NativeContracts;
use wasmtx_core::serializer::TraceSerializer;
use wasmtx_core::store::{Account, KeyId, MemoryStore, RegId, UserId};
use wasmtx_core::{InlineTransaction, Name, Permission, WasmContractTransaction};

fn name(text: &str) -> Name {
    Name::new(text).unwrap()
}

fn bank_transfer(from: &str, to: &str, amount: i64) -> InlineTransaction {
    let mut data = Writer::new();
    data.write_u64(name(from).value())
        .write_u64(name(to).value())
        .write_i64(amount)
        .write_u64(288_891_688_708)
        .write_string("bench");
    InlineTransaction {
        contract: name("wasmio.bank"),
        action: name("transfer"),
        authorization: vec![Permission {
            account: name(from),
            permission: name("active"),
        }],
        data: data.into_bytes(),
    }
}

fn setup() -> (MemoryStore, WasmContractTransaction, ScriptedEngine) {
    let mut store = MemoryStore::new();
    store.insert_account(Account {
        regid: RegId::new(1, 1),
        nickid: Some(name("alice")),
        keyid: KeyId([1; 20]),
        owner_pubkey: Some(vec![2; 33]),
    });

    // every transfer notifies both parties; bob answers with a receipt
    let mut receipt = bank_transfer("bob", "alice", 1);
    receipt.action = name("receipt");
    let engine = ScriptedEngine::new(4)
        .with_script(
            name("wasmio.bank"),
            name("transfer"),
            Script {
                console: "moved".into(),
                notify: vec![name("alice"), name("bob")],
                ..Default::default()
            },
        )
        .with_script(
            name("bob"),
            name("transfer"),
            Script {
                inline: vec![receipt],
                ..Default::default()
            },
        );

    let inline_transactions = (1..=8).map(|i| bank_transfer("alice", "bob", i * 10_000)).collect();
    let tx = WasmContractTransaction::new(UserId::RegId(RegId::new(1, 1)), "WICC", 100_000, 100, inline_transactions);
    (store, tx, engine)
}

fn bench_trace(c: &mut Criterion) {
    let natives = NativeContracts::default();

    c.bench_function("execute 8 nested transfers", |b| {
        let (mut store, mut tx, engine) = setup();
        b.iter(|| tx.execute(&mut store, &engine).unwrap());
    });

    c.bench_function("render nested trace", |b| {
        let (mut store, mut tx, engine) = setup();
        let trace = tx.execute(&mut store, &engine).unwrap();
        let serializer = TraceSerializer::new(&store, &natives);
        b.iter(|| serializer.render(black_box(&trace)));
    });
}

criterion_group!(benches, bench_trace);
criterion_main!(benches);
