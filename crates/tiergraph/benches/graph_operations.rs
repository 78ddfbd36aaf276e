use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tiergraph::{CallGraph, Direction, Layer, MethodNode};

// A layered fan-out graph: each node calls `fan` nodes of the next layer.
fn layered_graph(layers: usize, width: usize, fan: usize) -> CallGraph {
    let mut graph = CallGraph::new();
    let mut previous = Vec::new();
    for l in 0..layers {
        let current: Vec<_> = (0..width)
            .map(|w| graph.add_node(MethodNode::new(format!("L{l}.m{w}"), format!("L{l}"), "", Layer::Service)))
            .collect();
        for (i, &from) in previous.iter().enumerate() {
            for k in 0..fan {
                graph.add_edge(from, current[(i + k) % width]).unwrap();
            }
        }
        previous = current;
    }
    graph
}

fn bench_chain_enumeration(c: &mut Criterion) {
    let mut group = c.benchmark_group("call_chains");

    for fan in [1, 2, 3].iter() {
        let graph = layered_graph(8, 16, *fan);
        group.bench_with_input(BenchmarkId::new("fan", fan), fan, |b, _| {
            b.iter(|| black_box(graph.call_chains(0, 10).unwrap()));
        });
    }

    group.finish();
}

fn bench_scc(c: &mut Criterion) {
    let mut group = c.benchmark_group("scc");

    for size in [1000, 10_000].iter() {
        let mut graph = CallGraph::new();
        let ids: Vec<_> = (0..*size)
            .map(|i| graph.add_node(MethodNode::unresolved(format!("C.m{i}"))))
            .collect();
        for w in ids.windows(2) {
            graph.add_edge(w[0], w[1]).unwrap();
        }
        graph.add_edge(ids[ids.len() - 1], ids[0]).unwrap();

        group.bench_with_input(BenchmarkId::new("ring", size), size, |b, _| {
            b.iter(|| black_box(graph.find_strongly_connected_components()));
        });
    }

    group.finish();
}

fn bench_upstream_walk(c: &mut Criterion) {
    let graph = layered_graph(10, 50, 3);
    let last = graph.node_count() - 1;
    c.bench_function("upstream_walk", |b| {
        b.iter(|| black_box(graph.walk(last, Direction::Incoming, 20).unwrap()));
    });
}

criterion_group!(benches, bench_chain_enumeration, bench_scc, bench_upstream_walk);
criterion_main!(benches);
