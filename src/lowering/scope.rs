use std::collections::HashMap;

use inkwell::basic_block::BasicBlock;
use inkwell::types::BasicTypeEnum;
use inkwell::values::PointerValue;

/// One lexical nesting level: an emission cursor and the local symbols
/// declared directly in it. Scopes are held in a `Vec` on the engine; there
/// is no parent pointer — index order in that vector *is* the parent chain.
pub(super) struct Scope<'ctx> {
    pub block: BasicBlock<'ctx>,
    pub symbols: HashMap<String, (BasicTypeEnum<'ctx>, PointerValue<'ctx>)>,
}

impl<'ctx> Scope<'ctx> {
    pub fn new(block: BasicBlock<'ctx>) -> Self {
        Self {
            block,
            symbols: HashMap::new(),
        }
    }
}
