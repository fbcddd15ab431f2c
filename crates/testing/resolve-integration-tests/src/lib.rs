//! Shared fixtures for the resolution integration tests
//!
//! A [`World`] bundles a frozen symbol graph, a declaration cache and a
//! syntax factory that share one interner, so names written in syntax match
//! names declared in the graph.

use sb_intern::{Interner, Name};
use sb_resolve::{BindContext, DeclarationCache};
use sb_span::FileId;
use sb_symbols::{CoreLibrary, SymbolGraph, SymbolGraphBuilder};
use sb_syntax::SyntaxFactory;
use std::sync::Once;

/// Symbol graph, cache and syntax factory for one test
#[derive(Debug)]
pub struct World {
    /// The frozen entity graph
    pub graph: SymbolGraph,
    /// Shared lazily computed declarations
    pub cache: DeclarationCache,
    /// Builds syntax with the graph's interner
    pub syntax: SyntaxFactory,
    /// Well-known types
    pub core: CoreLibrary,
}

impl World {
    /// Builds a world; `declare` adds entities and returns whatever ids the test needs
    pub fn build<T>(declare: impl FnOnce(&mut SymbolGraphBuilder, &CoreLibrary) -> T) -> (Self, T) {
        Self::build_with_syntax(|builder, core, _| declare(builder, core))
    }

    /// Like [`World::build`], for declarations that carry syntax (constant initializers)
    pub fn build_with_syntax<T>(
        declare: impl FnOnce(&mut SymbolGraphBuilder, &CoreLibrary, &SyntaxFactory) -> T,
    ) -> (Self, T) {
        init_tracing();
        let interner = Interner::new();
        let syntax = SyntaxFactory::new(interner.clone(), FileId::new(0));
        let mut builder = SymbolGraphBuilder::new(interner);
        let core = builder.add_core_library();
        let ids = declare(&mut builder, &core, &syntax);
        let world = Self {
            graph: builder.finish(),
            cache: DeclarationCache::new(),
            syntax,
            core,
        };
        (world, ids)
    }

    /// A binding context with default policy
    pub fn context(&self) -> BindContext<'_> {
        BindContext::new(&self.graph, &self.cache)
    }

    /// Interns `text`
    pub fn name(&self, text: &str) -> Name {
        self.graph.interner().intern(text)
    }
}

/// Installs a test subscriber honouring `RUST_LOG`, once per process
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .finish();
        let _ignored = tracing::subscriber::set_global_default(subscriber);
    });
}
