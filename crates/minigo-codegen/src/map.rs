//! Maps.
//!
//! A map value is a pointer to a 24-byte header `{entries, len, cap}`.
//! Entries are 16-byte `{key cell, value cell}` pairs kept in insertion
//! order. A cell holds a narrow value itself and anything wider through a
//! pointer to a heap copy. Lookup is a linear scan.

use minigo_analysis::{GtypeKind, RuntimeFn, Width};
use minigo_common::{AsmLabel, GtypeId};
use minigo_syntax::ast::Expr;

use crate::context::{reg_width, CodegenContext};
use crate::error::{CodegenError, Result};

const ENTRY_SIZE: i64 = 16;

impl CodegenContext<'_> {
    /// Loads `m[key]` and returns the frame slot holding the "ok" flag.
    pub fn emit_map_get(&mut self, map: &Expr, key: &Expr, kt: GtypeId, vt: GtypeId) -> Result<i32> {
        let ok = self.func.alloc_temp(8);
        let header = self.func.alloc_temp(8);
        self.emit_expr(map)?;
        self.out.store_local(Width::Narrow, header);
        let key_slot = self.eval_key(key, kt)?;

        let (found, missing, end) = (self.new_label(), self.new_label(), self.new_label());
        let entry = self.emit_map_scan(header, key_slot, kt, found, missing);

        let w = self.width(vt);
        self.out.label(found);
        self.load_entry_value(entry, vt);
        self.out.push(reg_width(w));
        self.out.load_number(1);
        self.out.store_local(Width::Narrow, ok);
        self.out.pop(reg_width(w));
        self.out.jump("jmp", end);

        self.out.label(missing);
        self.out.load_number(0);
        self.out.store_local(Width::Narrow, ok);
        if w == Width::Aggregate {
            let size = self.size(vt);
            self.malloc_const(size);
            self.out.zero_at_rax(size);
        } else {
            self.out.load_empty(w);
        }
        self.out.label(end);
        Ok(ok)
    }

    /// `m[key] = value`, with the value in registers.
    pub fn emit_map_store(&mut self, map: &Expr, key: &Expr) -> Result<()> {
        let mt = self.ty(map)?;
        let (kt, vt) = match self.program.kind(mt) {
            GtypeKind::Map { key, value } => (*key, *value),
            _ => return Err(CodegenError::internal("map store into a non-map", map.span)),
        };
        let cell = self.value_cell(vt)?;
        let header = self.func.alloc_temp(8);
        self.emit_expr(map)?;
        self.out.store_local(Width::Narrow, header);
        self.map_insert(header, key, kt, cell)
    }

    /// Like [`emit_map_store`](Self::emit_map_store) for a map whose header
    /// pointer is already in the frame slot `header`.
    pub fn emit_map_store_into(&mut self, header: i32, key: &Expr, kt: GtypeId, vt: GtypeId) -> Result<()> {
        let cell = self.value_cell(vt)?;
        self.map_insert(header, key, kt, cell)
    }

    /// Length of the map whose header pointer is in `%rax`. A nil map has
    /// length 0.
    pub fn emit_map_len(&mut self) {
        let end = self.new_label();
        self.out.emit("TEST_IT");
        self.out.jump("je", end);
        self.out.add_number(8);
        self.out.load_deref(Width::Narrow);
        self.out.label(end);
    }

    /// Loads the address of entry `index` (a frame slot) of the map whose
    /// header is in the frame slot `header`.
    pub fn emit_entry_addr(&mut self, header: i32, index: i32) {
        self.out.load_local(Width::Narrow, header);
        self.out.load_deref(Width::Narrow);
        self.out.push(Width::Narrow);
        self.out.load_local(Width::Narrow, index);
        self.out.emit(format_args!("IMUL_NUMBER {}", ENTRY_SIZE));
        self.out.push(Width::Narrow);
        self.out.emit("SUM_FROM_STACK");
    }

    pub fn load_entry_key(&mut self, entry: i32, kt: GtypeId) {
        self.out.load_local(Width::Narrow, entry);
        self.out.load_deref(Width::Narrow);
        if self.width(kt) == Width::Wide {
            self.out.load_deref(Width::Wide);
        }
    }

    pub fn load_entry_value(&mut self, entry: i32, vt: GtypeId) {
        self.out.load_local(Width::Narrow, entry);
        self.out.add_number(8);
        self.out.load_deref(Width::Narrow);
        if self.width(vt) == Width::Wide {
            self.out.load_deref(Width::Wide);
        }
    }

    fn eval_key(&mut self, key: &Expr, kt: GtypeId) -> Result<i32> {
        let w = self.width(kt);
        if self.program.is_interface(kt) || w == Width::Aggregate {
            let name = self.type_name(kt);
            return Err(CodegenError::not_yet_implemented(&format!("map keys of type {}", name), key.span));
        }
        let slot = self.temp_for(w);
        self.emit_value_as(key, kt)?;
        self.out.store_local(reg_width(w), slot);
        Ok(slot)
    }

    /// Turns the value in registers into a cell word and parks it in a
    /// frame slot.
    fn value_cell(&mut self, vt: GtypeId) -> Result<i32> {
        let cell = self.func.alloc_temp(8);
        if matches!(self.width(vt), Width::Wide | Width::Aggregate) {
            self.emit_box(vt)?;
        }
        self.out.store_local(Width::Narrow, cell);
        Ok(cell)
    }

    /// Scans the entries for the key in `key_slot`. Jumps to `found` with
    /// the entry address in the returned slot, or to `missing`.
    fn emit_map_scan(&mut self, header: i32, key_slot: i32, kt: GtypeId, found: AsmLabel, missing: AsmLabel) -> i32 {
        let index = self.func.alloc_temp(8);
        let entry = self.func.alloc_temp(8);
        let top = self.new_label();
        self.out.load_number(0);
        self.out.store_local(Width::Narrow, index);

        self.out.label(top);
        self.out.load_local(Width::Narrow, header);
        self.out.emit("TEST_IT");
        self.out.jump("je", missing);
        self.out.load_local(Width::Narrow, index);
        self.out.push(Width::Narrow);
        self.out.load_local(Width::Narrow, header);
        self.out.add_number(8);
        self.out.load_deref(Width::Narrow);
        self.out.push(Width::Narrow);
        self.out.emit("CMP_FROM_STACK setl");
        self.out.emit("TEST_IT");
        self.out.jump("je", missing);

        self.emit_entry_addr(header, index);
        self.out.store_local(Width::Narrow, entry);
        self.load_entry_key(entry, kt);
        if self.width(kt) == Width::Wide {
            self.out.push(Width::Wide);
            self.out.load_local(Width::Wide, key_slot);
            self.out.push(Width::Wide);
            self.call_runtime(RuntimeFn::Strcmp);
            self.out.push(Width::Narrow);
            self.out.load_number(0);
            self.out.push(Width::Narrow);
        } else {
            self.out.push(Width::Narrow);
            self.out.load_local(Width::Narrow, key_slot);
            self.out.push(Width::Narrow);
        }
        self.out.emit("CMP_FROM_STACK sete");
        self.out.emit("TEST_IT");
        self.out.jump("jne", found);

        self.out.load_local(Width::Narrow, index);
        self.out.add_number(1);
        self.out.store_local(Width::Narrow, index);
        self.out.jump("jmp", top);
        entry
    }

    fn map_insert(&mut self, header: i32, key: &Expr, kt: GtypeId, cell: i32) -> Result<()> {
        let key_slot = self.eval_key(key, kt)?;
        let (found, missing, end) = (self.new_label(), self.new_label(), self.new_label());
        let entry = self.emit_map_scan(header, key_slot, kt, found, missing);

        self.out.label(found);
        self.out.load_local(Width::Narrow, cell);
        self.out.push(Width::Narrow);
        self.out.load_local(Width::Narrow, entry);
        self.out.add_number(8);
        self.out.push(Width::Narrow);
        self.out.store_indirect(Width::Narrow);
        self.out.jump("jmp", end);

        self.out.label(missing);
        let non_nil = self.new_label();
        self.out.load_local(Width::Narrow, header);
        self.out.emit("TEST_IT");
        self.out.jump("jne", non_nil);
        self.panic_with("assignment to entry in nil map");
        self.out.label(non_nil);
        self.emit_map_grow(header);

        // Append at entries[len].
        let len = self.func.alloc_temp(8);
        self.out.load_local(Width::Narrow, header);
        self.out.add_number(8);
        self.out.load_deref(Width::Narrow);
        self.out.store_local(Width::Narrow, len);
        self.emit_entry_addr(header, len);
        self.out.store_local(Width::Narrow, entry);

        self.out.load_local(reg_width(self.width(kt)), key_slot);
        if self.width(kt) == Width::Wide {
            self.emit_box(kt)?;
        }
        self.out.push(Width::Narrow);
        self.out.load_local(Width::Narrow, entry);
        self.out.push(Width::Narrow);
        self.out.store_indirect(Width::Narrow);

        self.out.load_local(Width::Narrow, cell);
        self.out.push(Width::Narrow);
        self.out.load_local(Width::Narrow, entry);
        self.out.add_number(8);
        self.out.push(Width::Narrow);
        self.out.store_indirect(Width::Narrow);

        self.out.load_local(Width::Narrow, len);
        self.out.add_number(1);
        self.out.push(Width::Narrow);
        self.out.load_local(Width::Narrow, header);
        self.out.add_number(8);
        self.out.push(Width::Narrow);
        self.out.store_indirect(Width::Narrow);
        self.out.label(end);
        Ok(())
    }

    /// Doubles the entry array when it is full. An empty map starts with
    /// room for four entries.
    fn emit_map_grow(&mut self, header: i32) {
        let room = self.new_label();
        let sized = self.new_label();
        let new_cap = self.func.alloc_temp(8);
        let fresh = self.func.alloc_temp(8);

        self.out.load_local(Width::Narrow, header);
        self.out.add_number(8);
        self.out.load_deref(Width::Narrow);
        self.out.push(Width::Narrow);
        self.out.load_local(Width::Narrow, header);
        self.out.add_number(16);
        self.out.load_deref(Width::Narrow);
        self.out.push(Width::Narrow);
        self.out.emit("CMP_FROM_STACK setl");
        self.out.emit("TEST_IT");
        self.out.jump("jne", room);

        self.out.load_local(Width::Narrow, header);
        self.out.add_number(16);
        self.out.load_deref(Width::Narrow);
        self.out.emit("IMUL_NUMBER 2");
        self.out.store_local(Width::Narrow, new_cap);
        self.out.emit("TEST_IT");
        self.out.jump("jne", sized);
        self.out.load_number(4);
        self.out.store_local(Width::Narrow, new_cap);
        self.out.label(sized);

        self.out.load_local(Width::Narrow, new_cap);
        self.out.emit(format_args!("IMUL_NUMBER {}", ENTRY_SIZE));
        self.malloc_dynamic();
        self.out.store_local(Width::Narrow, fresh);

        // memcopy(dst, src, len*16)
        self.out.push(Width::Narrow);
        self.out.load_local(Width::Narrow, header);
        self.out.load_deref(Width::Narrow);
        self.out.push(Width::Narrow);
        self.out.load_local(Width::Narrow, header);
        self.out.add_number(8);
        self.out.load_deref(Width::Narrow);
        self.out.emit(format_args!("IMUL_NUMBER {}", ENTRY_SIZE));
        self.out.push(Width::Narrow);
        self.call_runtime(RuntimeFn::Memcopy);

        self.out.load_local(Width::Narrow, fresh);
        self.out.push(Width::Narrow);
        self.out.load_local(Width::Narrow, header);
        self.out.push(Width::Narrow);
        self.out.store_indirect(Width::Narrow);
        self.out.load_local(Width::Narrow, new_cap);
        self.out.push(Width::Narrow);
        self.out.load_local(Width::Narrow, header);
        self.out.add_number(16);
        self.out.push(Width::Narrow);
        self.out.store_indirect(Width::Narrow);
        self.out.label(room);
    }
}
