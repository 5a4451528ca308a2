pub mod loggable;

use core::{cell::RefCell, fmt::Write, marker::PhantomData};
use std::{rc::Rc, vec::Vec};

use compact_str::CompactString;

use crate::Level;

use self::loggable::Loggable;

std::thread_local! {
    /// 每个执行流（宿主机线程）各自的 span 栈
    static SPAN_STACK: RefCell<Vec<Rc<SpanData>>> = const { RefCell::new(Vec::new()) };
}

/// 一段带名字和键值对的上下文，进入后其中打印的日志都会带上它
pub struct Span {
    data: Option<Rc<SpanData>>,
}

impl Span {
    /// 创建一个新的 span。但只是将其注册，而没有实际实际启用。
    ///
    /// 调用 `entered()` 以进入该 span
    pub fn new<'a>(
        level: Level,
        name: &'static str,
        kvs: Option<&'a [(&'static str, &'a dyn Loggable)]>,
    ) -> Self {
        let kvs = kvs.map(|kvs| {
            let mut kvs_str = CompactString::new("");
            for (i, (key, value)) in kvs.iter().enumerate() {
                if i > 0 {
                    kvs_str.push(' ');
                }
                let _ = write!(kvs_str, "{key}=");
                value.log(&mut kvs_str);
            }
            kvs_str
        });

        Span {
            data: Some(Rc::new(SpanData { level, name, kvs })),
        }
    }

    /// 等级不够时宏会生成这样的 span，进入和退出都不做任何事
    pub fn disabled() -> Self {
        Self { data: None }
    }

    pub fn is_disabled(&self) -> bool {
        self.data.is_none()
    }

    pub fn entered(self) -> OwnedEnterGuard {
        if let Some(data) = &self.data {
            SPAN_STACK.with_borrow_mut(|stack| stack.push(Rc::clone(data)));
        }
        OwnedEnterGuard {
            span: self,
            _not_send: PhantomData,
        }
    }

    /// 在该 span 中执行 `f`
    pub fn in_scope<R>(self, f: impl FnOnce() -> R) -> R {
        let _enter = self.entered();
        f()
    }
}

#[must_use = "once a span has been entered, it should be exited"]
pub struct OwnedEnterGuard {
    span: Span,
    _not_send: PhantomData<*const ()>,
}

impl Drop for OwnedEnterGuard {
    fn drop(&mut self) {
        if let Some(data) = &self.span.data {
            let _span = SPAN_STACK.with_borrow_mut(Vec::pop);
            // 维持一个栈结构，因此退出的 span 应当与进入的 span 保持一致
            debug_assert!(_span.is_some_and(|span| Rc::ptr_eq(&span, data)));
        }
    }
}

#[derive(Debug)]
pub struct SpanData {
    level: Level,
    name: &'static str,
    kvs: Option<CompactString>,
}

impl SpanData {
    pub fn level(&self) -> Level {
        self.level
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kvs(&self) -> Option<&str> {
        self.kvs.as_deref()
    }
}

/// 遍历当前执行流的 span 栈，从外到内
pub(crate) fn for_each_entered(mut f: impl FnMut(&SpanData)) {
    SPAN_STACK.with_borrow(|stack| stack.iter().for_each(|data| f(data)));
}
